//! Terminal drawing backend for waveform views.
//!
//! Each terminal cell is a 2x4 grid of braille dots, so a view laid out in dot units
//! gets eight times the resolution of plain block characters. Primitives are
//! rasterized into a dot buffer first and folded into cells when the widget renders.

use crate::waveform::{BarGeometry, DrawSurface, Paint, Rgb, Viewport};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

/// Braille dots per cell horizontally.
pub const DOTS_PER_COLUMN: u16 = 2;
/// Braille dots per cell vertically.
pub const DOTS_PER_ROW: u16 = 4;

const BRAILLE_BASE: u32 = 0x2800;

/// Color translucent primitives are blended over; matches the screen background.
const BACKGROUND: Rgb = Rgb::new(0, 0, 0);

/// Bit of each dot inside a braille cell, indexed `[row][column]`.
const BRAILLE_BITS: [[u32; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

/// Viewport in dot units for a terminal area.
pub fn canvas_viewport(area: Rect) -> Viewport {
    Viewport::new(
        (area.width * DOTS_PER_COLUMN) as f32,
        (area.height * DOTS_PER_ROW) as f32,
    )
}

/// A dot raster the waveform views draw into.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    width: usize,
    height: usize,
    dots: Vec<Option<Rgb>>,
}

impl CanvasSurface {
    /// Creates a blank surface covering `area`.
    pub fn new(area: Rect) -> Self {
        let width = (area.width * DOTS_PER_COLUMN) as usize;
        let height = (area.height * DOTS_PER_ROW) as usize;
        Self {
            width,
            height,
            dots: vec![None; width * height],
        }
    }

    pub fn dot(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.dots[y * self.width + x]
    }

    fn blend(&self, color: Rgb, alpha: f32) -> Rgb {
        BACKGROUND.lerp(color, alpha)
    }

    fn set_dot(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let index = y as usize * self.width + x as usize;
        self.dots[index] = Some(color);
    }

    /// Dot index range whose centers fall inside `[start, end)`.
    fn covered(start: f32, end: f32) -> std::ops::Range<i64> {
        let first = (start - 0.5).ceil() as i64;
        let last = (end - 0.5).ceil() as i64;
        first..last
    }
}

/// Whether the dot centered at `(cx, cy)` is cut away by a rounded corner.
fn outside_corner(rect: &BarGeometry, radius: f32, cx: f32, cy: f32) -> bool {
    if radius <= 0.0 {
        return false;
    }
    let dx = (cx - rect.x0).min(rect.x1 - cx);
    let dy = (cy - rect.y0).min(rect.y1 - cy);
    if dx >= radius || dy >= radius {
        return false;
    }
    let ox = radius - dx;
    let oy = radius - dy;
    ox * ox + oy * oy > radius * radius
}

impl DrawSurface for CanvasSurface {
    fn fill_rounded_rect(&mut self, rect: BarGeometry, corner_radius: f32, paint: &Paint, alpha: f32) {
        let radius = corner_radius.min(rect.height() / 2.0).max(0.0);
        for y in Self::covered(rect.y0, rect.y1) {
            let cy = y as f32 + 0.5;
            let color = self.blend(paint.color_at(cy), alpha);
            for x in Self::covered(rect.x0, rect.x1) {
                let cx = x as f32 + 0.5;
                if outside_corner(&rect, radius, cx, cy) {
                    continue;
                }
                self.set_dot(x, y, color);
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgb, alpha: f32) {
        let color = self.blend(color, alpha);
        let half = (stroke_width / 2.0).max(0.5);
        let length = (to.0 - from.0).hypot(to.1 - from.1);
        let steps = (length * 2.0).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let px = from.0 + (to.0 - from.0) * t;
            let py = from.1 + (to.1 - from.1) * t;
            for y in Self::covered(py - half, py + half) {
                for x in Self::covered(px - half, px + half) {
                    self.set_dot(x, y, color);
                }
            }
        }
    }
}

impl Widget for &CanvasSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = (self.width / DOTS_PER_COLUMN as usize).min(area.width as usize);
        let rows = (self.height / DOTS_PER_ROW as usize).min(area.height as usize);

        for row in 0..rows {
            for column in 0..columns {
                let mut bits = 0u32;
                let mut sum = [0u32; 3];
                let mut lit = 0u32;
                for (dy, row_bits) in BRAILLE_BITS.iter().enumerate() {
                    for (dx, bit) in row_bits.iter().enumerate() {
                        let x = column * DOTS_PER_COLUMN as usize + dx;
                        let y = row * DOTS_PER_ROW as usize + dy;
                        if let Some(color) = self.dot(x, y) {
                            bits |= bit;
                            sum[0] += color.r as u32;
                            sum[1] += color.g as u32;
                            sum[2] += color.b as u32;
                            lit += 1;
                        }
                    }
                }
                if lit == 0 {
                    continue;
                }
                let Some(symbol) = char::from_u32(BRAILLE_BASE + bits) else {
                    continue;
                };
                let fg = Color::Rgb(
                    (sum[0] / lit) as u8,
                    (sum[1] / lit) as u8,
                    (sum[2] / lit) as u8,
                );
                if let Some(cell) = buf.cell_mut((area.x + column as u16, area.y + row as u16)) {
                    cell.set_char(symbol).set_fg(fg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::{LiveWaveform, StyleConfig};

    const RED: Rgb = Rgb::new(200, 0, 0);

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> BarGeometry {
        BarGeometry { x0, y0, x1, y1 }
    }

    #[test]
    fn test_viewport_is_measured_in_dots() {
        assert_eq!(canvas_viewport(Rect::new(0, 0, 10, 3)), Viewport::new(20.0, 12.0));
    }

    #[test]
    fn test_fill_covers_dot_centers_only() {
        let mut surface = CanvasSurface::new(Rect::new(0, 0, 2, 1));
        surface.fill_rounded_rect(rect(1.0, 0.0, 3.0, 2.6), 0.0, &Paint::Solid(RED), 1.0);

        assert_eq!(surface.dot(0, 0), None);
        assert_eq!(surface.dot(1, 0), Some(RED));
        assert_eq!(surface.dot(2, 2), Some(RED));
        assert_eq!(surface.dot(3, 0), None);
        assert_eq!(surface.dot(1, 3), None);
    }

    #[test]
    fn test_alpha_blends_over_background() {
        let mut surface = CanvasSurface::new(Rect::new(0, 0, 1, 1));
        surface.fill_rounded_rect(rect(0.0, 0.0, 2.0, 4.0), 0.0, &Paint::Solid(RED), 0.5);
        assert_eq!(surface.dot(0, 0), Some(Rgb::new(100, 0, 0)));
    }

    #[test]
    fn test_rounded_corners_are_cut() {
        let mut surface = CanvasSurface::new(Rect::new(0, 0, 2, 2));
        surface.fill_rounded_rect(rect(0.0, 0.0, 4.0, 8.0), 2.0, &Paint::Solid(RED), 1.0);

        assert_eq!(surface.dot(0, 0), None);
        assert_eq!(surface.dot(3, 7), None);
        assert_eq!(surface.dot(1, 1), Some(RED));
        assert_eq!(surface.dot(0, 4), Some(RED));
    }

    #[test]
    fn test_vertical_line() {
        let mut surface = CanvasSurface::new(Rect::new(0, 0, 2, 1));
        surface.draw_line((2.5, 0.0), (2.5, 4.0), 1.0, RED, 1.0);
        for y in 0..4 {
            assert_eq!(surface.dot(1, y), None);
            assert_eq!(surface.dot(2, y), Some(RED));
        }
    }

    #[test]
    fn test_full_cell_renders_as_solid_braille() {
        let area = Rect::new(0, 0, 2, 1);
        let mut surface = CanvasSurface::new(area);
        surface.fill_rounded_rect(rect(0.0, 0.0, 2.0, 4.0), 0.0, &Paint::Solid(RED), 1.0);

        let mut buf = Buffer::empty(area);
        (&surface).render(area, &mut buf);

        assert_eq!(buf[(0u16, 0u16)].symbol(), "⣿");
        assert_eq!(buf[(0u16, 0u16)].fg, Color::Rgb(200, 0, 0));
        assert_eq!(buf[(1u16, 0u16)].symbol(), " ");
    }

    #[test]
    fn test_live_view_draws_onto_canvas() {
        let area = Rect::new(0, 0, 8, 4);
        let mut style = StyleConfig::default()
            .with_gradient(RED, RED)
            .with_fade_by_age(false)
            .with_soft_transition(false);
        style.now_line_color = None;
        let mut view = LiveWaveform::new(style);
        let viewport = canvas_viewport(area);
        view.on_viewport_resized(viewport.width, viewport.height);
        view.update(22_760);

        let mut surface = CanvasSurface::new(area);
        view.render(&mut surface);

        let lit = (0..16)
            .flat_map(|x| (0..16).map(move |y| (x, y)))
            .filter(|&(x, y)| surface.dot(x, y) == Some(RED))
            .count();
        assert!(lit > 0);
    }
}
