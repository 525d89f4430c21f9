use crate::color::{Rgb, BACKGROUND};
use crate::surface::{disc_cells, line_cells, Surface};
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A dot counts as lit once it departs this far from the background
const LIT_THRESHOLD: u8 = 12;

/// Default field units covered by one Braille dot
pub const DEFAULT_UNITS_PER_DOT: f32 = 3.0;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Dot-resolution color buffer behind the terminal canvas.
///
/// Keeps its contents between frames so trails can fade out gradually.
pub struct BrailleCanvas {
    cols: u16,
    rows: u16,
    units_per_dot: f32,
    dots: Vec<Rgb>,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16, units_per_dot: f32) -> Self {
        let dot_count = cols as usize * 2 * rows as usize * 4;
        Self {
            cols,
            rows,
            units_per_dot: units_per_dot.max(0.5),
            dots: vec![BACKGROUND; dot_count],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn units_per_dot(&self) -> f32 {
        self.units_per_dot
    }

    fn dot_width(&self) -> usize {
        self.cols as usize * 2
    }

    fn dot_height(&self) -> usize {
        self.rows as usize * 4
    }

    /// Field extent (in field units) this canvas displays
    pub fn field_size(&self) -> (f32, f32) {
        field_size(self.cols, self.rows, self.units_per_dot)
    }

    /// Resize to a new cell grid, clearing its contents
    pub fn resize(&mut self, cols: u16, rows: u16) {
        if cols != self.cols || rows != self.rows {
            *self = Self::new(cols, rows, self.units_per_dot);
        }
    }

    /// Field coordinates at the center of terminal cell (col, row) of this canvas
    pub fn cell_to_field(&self, col: u16, row: u16) -> (f32, f32) {
        (
            (col as f32 + 0.5) * 2.0 * self.units_per_dot,
            (row as f32 + 0.5) * 4.0 * self.units_per_dot,
        )
    }

    fn blend_dot(&mut self, dx: usize, dy: usize, color: Rgb, alpha: f32) {
        let width = self.dot_width();
        if let Some(dot) = self.dots.get_mut(dy * width + dx) {
            *dot = dot.blend(color, alpha);
        }
    }

    /// Collapse the dot buffer into Braille cells; cells with no lit dot are skipped
    pub fn cells(&self) -> Vec<BrailleCell> {
        let width = self.dot_width();
        let mut cells = Vec::with_capacity(self.cols as usize * self.rows as usize);

        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let mut pattern: u8 = 0;
                let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
                let mut lit: u32 = 0;

                // Sample the 2x4 dots for this Braille character
                let base_bx = cx as usize * 2;
                let base_by = cy as usize * 4;

                for dx in 0..2 {
                    for dy in 0..4 {
                        let dot = self.dots[(base_by + dy) * width + base_bx + dx];
                        if dot.distance(BACKGROUND) > LIT_THRESHOLD {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            r += dot.r as u32;
                            g += dot.g as u32;
                            b += dot.b as u32;
                            lit += 1;
                        }
                    }
                }

                if pattern != 0 {
                    let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                    cells.push(BrailleCell {
                        x: cx,
                        y: cy,
                        char: braille_char,
                        color: Color::Rgb((r / lit) as u8, (g / lit) as u8, (b / lit) as u8),
                    });
                }
            }
        }

        cells
    }
}

impl Surface for BrailleCanvas {
    fn fade(&mut self, color: Rgb, alpha: f32) {
        if alpha >= 1.0 {
            self.dots.fill(color);
        } else {
            for dot in &mut self.dots {
                *dot = dot.blend(color, alpha);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let (w, h, scale) = (self.dot_width(), self.dot_height(), self.units_per_dot);
        let mut hits = Vec::new();
        disc_cells(cx, cy, radius, scale, w, h, |x, y| hits.push((x, y)));
        for (x, y) in hits {
            self.blend_dot(x, y, color, alpha);
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb, alpha: f32) {
        let (w, h, scale) = (self.dot_width(), self.dot_height(), self.units_per_dot);
        let mut hits = Vec::new();
        line_cells(x0, y0, x1, y1, scale, w, h, |x, y| hits.push((x, y)));
        for (x, y) in hits {
            self.blend_dot(x, y, color, alpha);
        }
    }
}

/// Field extent for a canvas of `cols` x `rows` terminal cells.
/// Braille gives 2x4 dots per character.
pub fn field_size(cols: u16, rows: u16, units_per_dot: f32) -> (f32, f32) {
    (
        cols as f32 * 2.0 * units_per_dot,
        rows as f32 * 4.0 * units_per_dot,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_blank_canvas_has_no_cells() {
        let canvas = BrailleCanvas::new(10, 5, 3.0);
        assert!(canvas.cells().is_empty());
    }

    #[test]
    fn test_single_dot_lights_one_cell() {
        let mut canvas = BrailleCanvas::new(10, 5, 1.0);
        // Dot (3, 5): cell (1, 1), column 1 row 1 within the cell
        canvas.fill_circle(3.5, 5.5, 0.1, Rgb::new(255, 255, 255), 1.0);
        let cells = canvas.cells();
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].x, cells[0].y), (1, 1));
        assert_eq!(cells[0].char, char::from_u32(BRAILLE_BASE + 0x10).unwrap());
        assert_eq!(cells[0].color, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_faint_line_stays_unlit() {
        let mut canvas = BrailleCanvas::new(10, 5, 1.0);
        canvas.stroke_line(0.0, 0.0, 19.0, 0.0, Rgb::new(100, 200, 255), 0.01);
        assert!(canvas.cells().is_empty());

        canvas.stroke_line(0.0, 0.0, 19.0, 0.0, Rgb::new(100, 200, 255), 0.3);
        assert_eq!(canvas.cells().len(), 10);
    }

    #[test]
    fn test_full_fade_clears_and_partial_fade_dims() {
        let mut canvas = BrailleCanvas::new(4, 2, 1.0);
        canvas.fill_circle(1.0, 1.0, 0.2, Rgb::new(255, 255, 255), 1.0);
        canvas.fade(BACKGROUND, 0.1);
        assert_eq!(canvas.cells().len(), 1);
        canvas.fade(BACKGROUND, 1.0);
        assert!(canvas.cells().is_empty());
    }

    #[test]
    fn test_field_mapping() {
        let canvas = BrailleCanvas::new(80, 40, 3.0);
        assert_eq!(canvas.field_size(), (480.0, 480.0));
        assert_eq!(canvas.cell_to_field(0, 0), (3.0, 6.0));
    }
}
