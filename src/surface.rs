use crate::color::{core_color, glow_color, Rgb, BACKGROUND, LINK_COLOR};
use crate::simulation::ParticleField;

/// Halo radius relative to the particle radius
const GLOW_SCALE: f32 = 1.5;

/// A 2D target the field can be drawn onto, addressed in field units
pub trait Surface {
    /// Wash the whole surface toward `color` with opacity `alpha`
    fn fade(&mut self, color: Rgb, alpha: f32);

    /// Blend a filled disc
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32);

    /// Blend a one-cell-wide line segment
    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb, alpha: f32);
}

/// Draw pass for one frame: background wash, particles, then proximity links
pub fn draw_field<S: Surface>(surface: &mut S, field: &ParticleField) {
    let settings = &field.settings;
    let wash = if settings.trails { settings.trail_fade } else { 1.0 };
    surface.fade(BACKGROUND, wash);

    let particles = field.particles();
    for p in particles {
        surface.fill_circle(p.x, p.y, p.radius * GLOW_SCALE, glow_color(p.hue), 1.0);
        surface.fill_circle(p.x, p.y, p.radius, core_color(p.hue), 1.0);
    }

    for link in field.links() {
        let (a, b) = (&particles[link.a], &particles[link.b]);
        surface.stroke_line(a.x, a.y, b.x, b.y, LINK_COLOR, link.opacity);
    }
}

/// Map a field coordinate to a cell index on a grid of `n` cells of size `scale`.
/// A coordinate sitting exactly on the far edge belongs to the last cell.
fn to_cell(v: f32, scale: f32, n: usize) -> Option<usize> {
    if n == 0 || v < 0.0 || !v.is_finite() {
        return None;
    }
    let i = (v / scale).floor() as usize;
    if i < n {
        Some(i)
    } else if i == n {
        Some(n - 1)
    } else {
        None
    }
}

/// Visit every grid cell whose center lies inside the disc. The cell
/// containing the disc center is always visited, so tiny particles still
/// show up on coarse grids.
pub fn disc_cells(
    cx: f32,
    cy: f32,
    radius: f32,
    scale: f32,
    cols: usize,
    rows: usize,
    mut visit: impl FnMut(usize, usize),
) {
    let center = match (to_cell(cx, scale, cols), to_cell(cy, scale, rows)) {
        (Some(ix), Some(iy)) => Some((ix, iy)),
        _ => None,
    };
    if let Some((ix, iy)) = center {
        visit(ix, iy);
    }

    let r_sq = radius * radius;
    let min_x = ((cx - radius) / scale).floor().max(0.0) as usize;
    let min_y = ((cy - radius) / scale).floor().max(0.0) as usize;
    let max_x = (((cx + radius) / scale).floor().max(0.0) as usize).min(cols.saturating_sub(1));
    let max_y = (((cy + radius) / scale).floor().max(0.0) as usize).min(rows.saturating_sub(1));
    if cols == 0 || rows == 0 {
        return;
    }

    for iy in min_y..=max_y {
        for ix in min_x..=max_x {
            if center == Some((ix, iy)) {
                continue;
            }
            let px = (ix as f32 + 0.5) * scale - cx;
            let py = (iy as f32 + 0.5) * scale - cy;
            if px * px + py * py <= r_sq {
                visit(ix, iy);
            }
        }
    }
}

/// Visit the grid cells along a segment (DDA), each cell at most once in a row
pub fn line_cells(
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    scale: f32,
    cols: usize,
    rows: usize,
    mut visit: impl FnMut(usize, usize),
) {
    let (gx0, gy0) = (x0 / scale, y0 / scale);
    let (dx, dy) = (x1 / scale - gx0, y1 / scale - gy0);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

    let mut last = None;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (gx0 + dx * t) * scale;
        let y = (gy0 + dy * t) * scale;
        if let (Some(ix), Some(iy)) = (to_cell(x, scale, cols), to_cell(y, scale, rows)) {
            if last != Some((ix, iy)) {
                visit(ix, iy);
                last = Some((ix, iy));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FieldSettings;

    /// Records draw calls instead of rasterising
    #[derive(Default)]
    struct Recorder {
        fades: Vec<f32>,
        circles: usize,
        lines: Vec<f32>,
    }

    impl Surface for Recorder {
        fn fade(&mut self, _color: Rgb, alpha: f32) {
            self.fades.push(alpha);
        }

        fn fill_circle(&mut self, _cx: f32, _cy: f32, _radius: f32, _color: Rgb, _alpha: f32) {
            self.circles += 1;
        }

        fn stroke_line(&mut self, _x0: f32, _y0: f32, _x1: f32, _y1: f32, _color: Rgb, alpha: f32) {
            self.lines.push(alpha);
        }
    }

    #[test]
    fn test_empty_field_only_fades() {
        let settings = FieldSettings {
            particle_count: 0,
            ..Default::default()
        };
        let field = ParticleField::with_seed(100.0, 100.0, settings, 3);
        let mut rec = Recorder::default();
        draw_field(&mut rec, &field);
        assert_eq!(rec.fades.len(), 1);
        assert_eq!(rec.circles, 0);
        assert!(rec.lines.is_empty());
    }

    #[test]
    fn test_draw_emits_glow_core_and_links() {
        let settings = FieldSettings {
            particle_count: 12,
            trails: false,
            ..Default::default()
        };
        // Small field: every pair is within link distance
        let field = ParticleField::with_seed(30.0, 30.0, settings, 3);
        let mut rec = Recorder::default();
        draw_field(&mut rec, &field);
        assert_eq!(rec.fades, vec![1.0]);
        assert_eq!(rec.circles, 24);
        assert_eq!(rec.lines.len(), 66);
        assert!(rec.lines.iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_disc_always_covers_center_cell() {
        let mut hits = Vec::new();
        disc_cells(7.0, 7.0, 0.1, 3.0, 10, 10, |x, y| hits.push((x, y)));
        assert_eq!(hits, vec![(2, 2)]);
    }

    #[test]
    fn test_disc_clipped_at_edges() {
        let mut hits = Vec::new();
        disc_cells(0.0, 0.0, 5.0, 1.0, 4, 4, |x, y| hits.push((x, y)));
        assert!(hits.contains(&(0, 0)));
        assert!(hits.iter().all(|&(x, y)| x < 4 && y < 4));
    }

    #[test]
    fn test_far_edge_maps_to_last_cell() {
        assert_eq!(to_cell(30.0, 3.0, 10), Some(9));
        assert_eq!(to_cell(33.5, 3.0, 10), None);
        assert_eq!(to_cell(-0.1, 3.0, 10), None);
    }

    #[test]
    fn test_line_cells_are_contiguous_and_unique() {
        let mut hits = Vec::new();
        line_cells(0.5, 0.5, 9.5, 0.5, 1.0, 10, 10, |x, y| hits.push((x, y)));
        let expected: Vec<(usize, usize)> = (0..10).map(|x| (x, 0)).collect();
        assert_eq!(hits, expected);

        let mut diag = Vec::new();
        line_cells(0.5, 0.5, 4.5, 4.5, 1.0, 10, 10, |x, y| diag.push((x, y)));
        assert_eq!(diag.first(), Some(&(0, 0)));
        assert_eq!(diag.last(), Some(&(4, 4)));
    }
}
