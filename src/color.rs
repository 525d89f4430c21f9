use rand::Rng;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color shared by the terminal and raster surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Source-over blend of `src` onto `self` with opacity `alpha` (0.0-1.0)
    pub fn blend(self, src: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * a).round() as u8;
        Rgb::new(mix(self.r, src.r), mix(self.g, src.g), mix(self.b, src.b))
    }

    /// Largest per-channel difference between two colors
    pub fn distance(self, other: Rgb) -> u8 {
        self.r
            .abs_diff(other.r)
            .max(self.g.abs_diff(other.g))
            .max(self.b.abs_diff(other.b))
    }

    /// Convert HSL (hue in degrees, saturation/lightness 0.0-1.0) to RGB
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Rgb {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - chroma / 2.0;

        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}

/// Deep slate used behind the field
pub const BACKGROUND: Rgb = Rgb::new(15, 23, 42);

/// Stroke color of proximity links
pub const LINK_COLOR: Rgb = Rgb::new(100, 200, 255);

const SATURATION: f32 = 0.70;
const CORE_LIGHTNESS: f32 = 0.60;
const GLOW_LIGHTNESS: f32 = 0.30;

/// Hues in a generated palette
pub const CUSTOM_HUES: usize = 5;

/// Hue band particles are colored from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Cyan through blue, the classic constellation look
    #[default]
    Cool,
    /// Greens drifting into teal
    Aurora,
    /// Reds and oranges
    Ember,
    /// Single blue-grey hue
    Mono,
    /// Five generated hues; particles pick one of them
    Custom([f32; CUSTOM_HUES]),
}

impl Palette {
    pub fn name(&self) -> &str {
        match self {
            Palette::Cool => "Cool",
            Palette::Aurora => "Aurora",
            Palette::Ember => "Ember",
            Palette::Mono => "Mono",
            Palette::Custom(_) => "Custom",
        }
    }

    /// Five hues drawn uniformly from the color wheel
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut hues = [0.0f32; CUSTOM_HUES];
        for hue in hues.iter_mut() {
            *hue = rng.gen_range(0.0..360.0);
        }
        Palette::Custom(hues)
    }

    /// Custom palettes sit outside the cycle and step back onto it
    pub fn next(&self) -> Self {
        match self {
            Palette::Cool => Palette::Aurora,
            Palette::Aurora => Palette::Ember,
            Palette::Ember => Palette::Mono,
            Palette::Mono | Palette::Custom(_) => Palette::Cool,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Palette::Cool | Palette::Custom(_) => Palette::Mono,
            Palette::Aurora => Palette::Cool,
            Palette::Ember => Palette::Aurora,
            Palette::Mono => Palette::Ember,
        }
    }

    /// Map a unit sample (0.0-1.0) onto this palette's hues
    pub fn hue_at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let (start, span) = match self {
            Palette::Cool => (180.0, 60.0),
            Palette::Aurora => (110.0, 70.0),
            Palette::Ember => (0.0, 40.0),
            Palette::Mono => (210.0, 0.0),
            Palette::Custom(hues) => {
                let i = ((t * CUSTOM_HUES as f32) as usize).min(CUSTOM_HUES - 1);
                return hues[i];
            }
        };
        start + t * span
    }

    pub fn parse(s: &str) -> Option<Palette> {
        match s.to_lowercase().as_str() {
            "cool" | "blue" => Some(Palette::Cool),
            "aurora" | "green" => Some(Palette::Aurora),
            "ember" | "fire" | "warm" => Some(Palette::Ember),
            "mono" | "grey" | "gray" => Some(Palette::Mono),
            _ => None,
        }
    }
}

/// Core fill color for a particle hue
pub fn core_color(hue: f32) -> Rgb {
    Rgb::from_hsl(hue, SATURATION, CORE_LIGHTNESS)
}

/// Dimmer halo color drawn around the core
pub fn glow_color(hue: f32) -> Rgb {
    Rgb::from_hsl(hue, SATURATION, GLOW_LIGHTNESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(Rgb::from_hsl(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsl(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsl(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hsl(180.0, 0.0, 1.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_blend_extremes() {
        let dst = Rgb::new(10, 20, 30);
        let src = Rgb::new(200, 100, 0);
        assert_eq!(dst.blend(src, 0.0), dst);
        assert_eq!(dst.blend(src, 1.0), src);
        assert_eq!(dst.blend(src, 0.5), Rgb::new(105, 60, 15));
    }

    #[test]
    fn test_cool_palette_stays_in_band() {
        let palette = Palette::Cool;
        assert_eq!(palette.hue_at(0.0), 180.0);
        assert_eq!(palette.hue_at(1.0), 240.0);
        assert_eq!(palette.hue_at(7.0), 240.0);

        // Cool colors: blue channel dominates red
        let c = core_color(palette.hue_at(0.5));
        assert!(c.b > c.r);
    }

    #[test]
    fn test_palette_cycle_round_trip() {
        let mut p = Palette::default();
        for _ in 0..4 {
            p = p.next();
        }
        assert_eq!(p, Palette::Cool);
        assert_eq!(Palette::Cool.next().prev(), Palette::Cool);
    }

    #[test]
    fn test_random_palette_picks_from_its_hues() {
        use rand::{rngs::StdRng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(5);
        let palette = Palette::random(&mut rng);
        let Palette::Custom(hues) = palette else {
            panic!("expected a custom palette");
        };
        assert!(hues.iter().all(|h| (0.0..360.0).contains(h)));
        assert_eq!(palette.hue_at(0.0), hues[0]);
        assert_eq!(palette.hue_at(0.5), hues[2]);
        assert_eq!(palette.hue_at(1.0), hues[4]);

        // Cycling leaves the custom palette
        assert_eq!(palette.next(), Palette::Cool);
        assert_eq!(palette.prev(), Palette::Mono);
    }

    #[test]
    fn test_glow_darker_than_core() {
        let core = core_color(200.0);
        let glow = glow_color(200.0);
        assert!(glow.b < core.b);
    }
}
