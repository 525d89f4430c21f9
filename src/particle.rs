use crate::settings::FieldSettings;
use rand::Rng;

/// A single decorative point-mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Velocity the particle relaxes back to once the pointer leaves
    pub base_vx: f32,
    pub base_vy: f32,
    pub radius: f32,
    /// Hue in degrees, fixed at creation
    pub hue: f32,
}

impl Particle {
    /// Particle at rest-velocity `(vx, vy)`, which also becomes its baseline
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32, hue: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            base_vx: vx,
            base_vy: vy,
            radius,
            hue,
        }
    }

    /// Draw a particle uniformly inside `[0, width] x [0, height]`
    pub fn random<R: Rng>(rng: &mut R, width: f32, height: f32, settings: &FieldSettings) -> Self {
        // Extents may be zero, so scale a unit sample instead of gen_range
        let x = rng.gen::<f32>() * width;
        let y = rng.gen::<f32>() * height;
        let vx = (rng.gen::<f32>() - 0.5) * 2.0 * settings.speed_range;
        let vy = (rng.gen::<f32>() - 0.5) * 2.0 * settings.speed_range;
        let radius = settings.min_radius + rng.gen::<f32>() * (settings.max_radius - settings.min_radius);
        let hue = settings.palette.hue_at(rng.gen::<f32>());
        Self::new(x, y, vx, vy, radius, hue)
    }

    /// Squared distance to another particle
    pub fn distance_sq(&self, other: &Particle) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_particle_ranges() {
        let settings = FieldSettings::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = Particle::random(&mut rng, 320.0, 200.0, &settings);
            assert!((0.0..=320.0).contains(&p.x));
            assert!((0.0..=200.0).contains(&p.y));
            assert!(p.vx.abs() <= settings.speed_range);
            assert!(p.vy.abs() <= settings.speed_range);
            assert!(p.radius >= settings.min_radius && p.radius < settings.max_radius);
            assert!((180.0..=240.0).contains(&p.hue));
            assert_eq!((p.vx, p.vy), (p.base_vx, p.base_vy));
        }
    }

    #[test]
    fn test_zero_extent_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = Particle::random(&mut rng, 0.0, 0.0, &FieldSettings::default());
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn test_distance_sq() {
        let a = Particle::new(0.0, 0.0, 0.0, 0.0, 1.0, 200.0);
        let b = Particle::new(3.0, 4.0, 0.0, 0.0, 1.0, 200.0);
        assert_eq!(a.distance_sq(&b), 25.0);
        assert_eq!(a.distance_sq(&a), 0.0);
    }
}
