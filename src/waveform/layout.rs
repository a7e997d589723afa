//! Horizontal placement of bars.
//!
//! Both layouts are pure functions of their inputs: laying out the same window in the
//! same viewport twice gives identical positions.

use super::style::Direction;
use super::window::{BarWindow, VisualBar};

/// A bar with its resolved leading-edge x coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedBar {
    /// Age index inside the window, 0 = oldest
    pub index: usize,
    pub x: f32,
    pub bar: VisualBar,
}

/// Places live bars so the newest one ends at the "now" anchor.
///
/// With `step = bar_width + bar_spacing` and `anchor_x = viewport_width *
/// anchor_fraction`, bar `i` of `n` sits at `i * step - (n * step - anchor_x)`. Bars
/// entirely outside `[-bar_width, viewport_width + bar_width]` are left out of the
/// result; they stay in the window until capacity evicts them.
pub fn scroll_layout(
    window: &BarWindow,
    viewport_width: f32,
    bar_width: f32,
    bar_spacing: f32,
    anchor_fraction: f32,
) -> Vec<PositionedBar> {
    let step = bar_width + bar_spacing;
    let anchor_x = viewport_width * anchor_fraction;
    let scroll_offset = window.len() as f32 * step - anchor_x;

    window
        .iter()
        .enumerate()
        .filter_map(|(index, bar)| {
            let x = index as f32 * step - scroll_offset;
            is_visible(x, bar_width, viewport_width).then_some(PositionedBar {
                index,
                x,
                bar: *bar,
            })
        })
        .collect()
}

fn is_visible(x: f32, bar_width: f32, viewport_width: f32) -> bool {
    x >= -bar_width && x <= viewport_width + bar_width
}

/// Mirrors positions for [`Direction::Reverse`]; forward layouts pass through.
pub fn apply_direction(
    mut bars: Vec<PositionedBar>,
    direction: Direction,
    viewport_width: f32,
    bar_width: f32,
) -> Vec<PositionedBar> {
    if direction == Direction::Reverse {
        for positioned in &mut bars {
            positioned.x = viewport_width - positioned.x - bar_width;
        }
    }
    bars
}

/// One slot of a static (file mode) layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSlot {
    pub x: f32,
    pub width: f32,
}

/// Spreads `count` bars across the full width exactly once.
///
/// Slot `i` starts at `i * (viewport_width / count) + bar_spacing / 2`.
pub fn static_layout(count: usize, viewport_width: f32, bar_spacing: f32) -> Vec<StaticSlot> {
    if count == 0 || !(viewport_width > 0.0) {
        return Vec::new();
    }
    let slot = viewport_width / count as f32;
    let half_spacing = bar_spacing / 2.0;
    let width = (slot - bar_spacing).max(slot.min(1.0));

    (0..count)
        .map(|i| StaticSlot {
            x: i as f32 * slot + half_spacing,
            width,
        })
        .collect()
}
