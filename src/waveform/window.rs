//! Bounded FIFO of live bars.

use super::style::Rgb;
use std::collections::VecDeque;

/// One rendered bar. Its height is fixed when it enters the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualBar {
    pub height: f32,
    /// Per-bar color override; `None` uses the style's color or gradient
    pub color: Option<Rgb>,
}

impl VisualBar {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            color: None,
        }
    }

    pub fn with_color(height: f32, color: Rgb) -> Self {
        Self {
            height,
            color: Some(color),
        }
    }
}

/// Number of bars that fit side by side in `viewport_width`.
///
/// Returns zero for a degenerate step or viewport.
pub fn capacity_for(viewport_width: f32, bar_width: f32, bar_spacing: f32) -> usize {
    let step = bar_width + bar_spacing;
    if !(step > 0.0) || !(viewport_width > 0.0) {
        return 0;
    }
    (viewport_width / step).floor() as usize
}

/// Chronologically ordered bars, oldest first, never longer than its capacity.
///
/// A capacity of zero means "unknown yet" and does not evict; the owning view sets
/// the real capacity once the viewport has a size.
#[derive(Debug, Clone, Default)]
pub struct BarWindow {
    bars: VecDeque<VisualBar>,
    capacity: usize,
}

impl BarWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `bar`, evicting the oldest bar first when the window is full.
    ///
    /// Returns the evicted bar, if any.
    pub fn push(&mut self, bar: VisualBar) -> Option<VisualBar> {
        let evicted = if self.capacity > 0 && self.bars.len() >= self.capacity {
            self.bars.pop_front()
        } else {
            None
        };
        self.bars.push_back(bar);
        evicted
    }

    /// Changes the capacity, dropping the oldest bars that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        if capacity > 0 {
            while self.bars.len() > capacity {
                self.bars.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.bars.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&VisualBar> {
        self.bars.back()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &VisualBar> + '_ {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(window: &BarWindow) -> Vec<f32> {
        window.iter().map(|bar| bar.height).collect()
    }

    #[test]
    fn test_capacity_from_viewport() {
        assert_eq!(capacity_for(100.0, 2.0, 1.0), 33);
        assert_eq!(capacity_for(12.0, 2.0, 1.0), 4);
        assert_eq!(capacity_for(0.0, 2.0, 1.0), 0);
        assert_eq!(capacity_for(100.0, 0.0, 0.0), 0);
    }

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let capacity = 5;
        let mut window = BarWindow::with_capacity(capacity);
        for i in 0..=capacity {
            window.push(VisualBar::new(i as f32));
        }

        assert_eq!(window.len(), capacity);
        assert_eq!(heights(&window), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_push_reports_evicted_bar() {
        let mut window = BarWindow::with_capacity(1);
        assert_eq!(window.push(VisualBar::new(1.0)), None);
        assert_eq!(window.push(VisualBar::new(2.0)), Some(VisualBar::new(1.0)));
    }

    #[test]
    fn test_zero_capacity_does_not_evict() {
        let mut window = BarWindow::default();
        for i in 0..10 {
            window.push(VisualBar::new(i as f32));
        }
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn test_shrinking_capacity_trims_oldest() {
        let mut window = BarWindow::with_capacity(4);
        for i in 0..4 {
            window.push(VisualBar::new(i as f32));
        }
        window.set_capacity(2);
        assert_eq!(heights(&window), vec![2.0, 3.0]);
    }

    #[test]
    fn test_clear_empties_but_keeps_capacity() {
        let mut window = BarWindow::with_capacity(3);
        window.push(VisualBar::new(1.0));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 3);
    }
}
