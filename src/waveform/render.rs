//! Geometry and color derivation for waveform bars.
//!
//! The render model turns positioned bars into backend-neutral [`DrawPrimitive`]s.
//! Hosts implement [`DrawSurface`] for their drawing backend (the terminal canvas in
//! this app, [`RecordingSurface`] in tests) and replay the primitives onto it.

use super::layout::{apply_direction, scroll_layout};
use super::style::{Alignment, Direction, Rgb, StyleConfig};
use super::window::{BarWindow, VisualBar};

/// Extra width a glow halo adds around a bar.
const GLOW_SPREAD: f32 = 2.0;

/// Opacity of a glow halo relative to its bar.
const GLOW_ALPHA_FACTOR: f32 = 0.6;

/// Size of the area waveforms are drawn into, in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether layout has happened yet.
    pub fn has_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned bar rectangle, `x0 <= x1` and `y0 <= y1` (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BarGeometry {
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    fn widened(&self, spread: f32) -> BarGeometry {
        BarGeometry {
            x0: self.x0 - spread / 2.0,
            y0: self.y0,
            x1: self.x1 + spread / 2.0,
            y1: self.y1,
        }
    }
}

/// Vertical extent of a bar of `height` whose leading edge is at `x`.
///
/// Center alignment spans `center_y ± height / 2`, bottom alignment grows up from
/// `viewport_height - padding`, top alignment hangs down from `padding`.
pub fn geometry(
    x: f32,
    bar_width: f32,
    height: f32,
    alignment: Alignment,
    viewport_height: f32,
    padding: f32,
) -> BarGeometry {
    let (y0, y1) = match alignment {
        Alignment::Center => {
            let center_y = viewport_height / 2.0;
            (center_y - height / 2.0, center_y + height / 2.0)
        }
        Alignment::Bottom => {
            let bottom_y = viewport_height - padding;
            (bottom_y - height, bottom_y)
        }
        Alignment::Top => (padding, padding + height),
    };
    BarGeometry {
        x0: x,
        y0,
        x1: x + bar_width,
        y1,
    }
}

/// Opacity of the bar at `index` out of `total`, oldest (index 0) most faded.
///
/// A lone bar is fully opaque.
pub fn fade_alpha(index: usize, total: usize, min_alpha: f32, max_alpha: f32) -> f32 {
    if total <= 1 {
        return 1.0;
    }
    let position = index as f32 / (total - 1) as f32;
    min_alpha + (max_alpha - min_alpha) * position
}

/// Two-stop linear gradient spanning the viewport height.
///
/// Built once per viewport size and shared by every bar; sampling depends only on y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientShader {
    pub top: Rgb,
    pub bottom: Rgb,
    pub span: f32,
}

impl GradientShader {
    pub fn vertical(top: Rgb, bottom: Rgb, viewport_height: f32) -> Self {
        Self {
            top,
            bottom,
            span: viewport_height,
        }
    }

    /// Builds the shader for `style` if it asks for one.
    pub fn for_style(style: &StyleConfig, viewport: Viewport) -> Option<Self> {
        style
            .gradient
            .filter(|_| viewport.height > 0.0)
            .map(|(top, bottom)| Self::vertical(top, bottom, viewport.height))
    }

    pub fn color_at(&self, y: f32) -> Rgb {
        if self.span <= 0.0 {
            return self.top;
        }
        self.top.lerp(self.bottom, y / self.span)
    }
}

/// How a bar's area is colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Rgb),
    Gradient(GradientShader),
}

impl Paint {
    /// Color at vertical position `y`.
    pub fn color_at(&self, y: f32) -> Rgb {
        match self {
            Paint::Solid(color) => *color,
            Paint::Gradient(shader) => shader.color_at(y),
        }
    }
}

/// Resolves a bar's paint: its own color, else the gradient, else the flat style color.
pub fn bar_paint(bar: &VisualBar, style: &StyleConfig, gradient: Option<&GradientShader>) -> Paint {
    match (bar.color, gradient) {
        (Some(color), _) => Paint::Solid(color),
        (None, Some(shader)) => Paint::Gradient(*shader),
        (None, None) => Paint::Solid(style.color),
    }
}

/// A backend-neutral drawing instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawPrimitive {
    Bar {
        rect: BarGeometry,
        corner_radius: f32,
        paint: Paint,
        alpha: f32,
    },
    Line {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        stroke_width: f32,
        color: Rgb,
        alpha: f32,
    },
}

impl DrawPrimitive {
    pub fn draw_on<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        match *self {
            DrawPrimitive::Bar {
                rect,
                corner_radius,
                paint,
                alpha,
            } => surface.fill_rounded_rect(rect, corner_radius, &paint, alpha),
            DrawPrimitive::Line {
                x0,
                y0,
                x1,
                y1,
                stroke_width,
                color,
                alpha,
            } => surface.draw_line((x0, y0), (x1, y1), stroke_width, color, alpha),
        }
    }
}

/// Capabilities a drawing backend must offer.
pub trait DrawSurface {
    fn fill_rounded_rect(&mut self, rect: BarGeometry, corner_radius: f32, paint: &Paint, alpha: f32);

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgb, alpha: f32);

    fn draw_all(&mut self, primitives: &[DrawPrimitive]) {
        for primitive in primitives {
            primitive.draw_on(self);
        }
    }
}

/// Headless surface that keeps every primitive it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub primitives: Vec<DrawPrimitive>,
}

impl RecordingSurface {
    /// Only the bar rectangles, in draw order.
    pub fn bars(&self) -> Vec<(BarGeometry, f32)> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                DrawPrimitive::Bar { rect, alpha, .. } => Some((*rect, *alpha)),
                DrawPrimitive::Line { .. } => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn fill_rounded_rect(&mut self, rect: BarGeometry, corner_radius: f32, paint: &Paint, alpha: f32) {
        self.primitives.push(DrawPrimitive::Bar {
            rect,
            corner_radius,
            paint: *paint,
            alpha,
        });
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgb, alpha: f32) {
        self.primitives.push(DrawPrimitive::Line {
            x0: from.0,
            y0: from.1,
            x1: to.0,
            y1: to.1,
            stroke_width,
            color,
            alpha,
        });
    }
}

/// Appends a bar (and its glow, when enabled) to `out`.
pub(crate) fn push_bar(
    out: &mut Vec<DrawPrimitive>,
    rect: BarGeometry,
    paint: Paint,
    alpha: f32,
    style: &StyleConfig,
) {
    let radius = |r: &BarGeometry| {
        if style.rounded_corners {
            (r.x1 - r.x0) / 2.0
        } else {
            0.0
        }
    };
    if style.glow_enabled {
        let halo = rect.widened(GLOW_SPREAD);
        out.push(DrawPrimitive::Bar {
            rect: halo,
            corner_radius: radius(&halo),
            paint,
            alpha: alpha * GLOW_ALPHA_FACTOR,
        });
    }
    out.push(DrawPrimitive::Bar {
        rect,
        corner_radius: radius(&rect),
        paint,
        alpha,
    });
}

/// Builds one frame of the scrolling (live) waveform.
pub fn scrolling_frame(
    window: &BarWindow,
    viewport: Viewport,
    style: &StyleConfig,
    gradient: Option<&GradientShader>,
) -> Vec<DrawPrimitive> {
    let mut out = Vec::with_capacity(window.len() + 1);
    if !viewport.has_size() {
        return out;
    }

    let positioned = apply_direction(
        scroll_layout(
            window,
            viewport.width,
            style.bar_width,
            style.bar_spacing,
            style.anchor_fraction,
        ),
        style.direction,
        viewport.width,
        style.bar_width,
    );

    let total = window.len();
    for item in positioned {
        let rect = geometry(
            item.x,
            style.bar_width,
            item.bar.height,
            style.alignment,
            viewport.height,
            style.top_bottom_padding,
        );
        let alpha = if style.fade_by_age_enabled {
            fade_alpha(item.index, total, style.min_alpha, style.max_alpha)
        } else {
            1.0
        };
        push_bar(&mut out, rect, bar_paint(&item.bar, style, gradient), alpha, style);
    }

    if let Some(color) = style.now_line_color {
        let anchor_x = viewport.width * style.anchor_fraction;
        let x = match style.direction {
            Direction::Forward => anchor_x,
            Direction::Reverse => viewport.width - anchor_x,
        };
        out.push(DrawPrimitive::Line {
            x0: x,
            y0: style.top_bottom_padding,
            x1: x,
            y1: viewport.height - style.top_bottom_padding,
            stroke_width: 1.0,
            color,
            alpha: 1.0,
        });
    }

    out
}
