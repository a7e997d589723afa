//! Scrolling waveform fed by live amplitude polls.

use super::render::{scrolling_frame, DrawPrimitive, DrawSurface, GradientShader, Viewport};
use super::sample::AmplitudeSource;
use super::smoothing::{smooth, REFERENCE_FRAME};
use super::style::StyleConfig;
use super::window::{capacity_for, BarWindow, VisualBar};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Updates held back while the viewport has no size are capped at this many.
const MAX_PENDING_UPDATES: usize = 1024;

/// Result of feeding one amplitude to a [`LiveWaveform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A bar was appended to the window.
    Applied,
    /// The viewport has no size yet; the amplitude is queued and replayed in order
    /// once [`LiveWaveform::on_viewport_resized`] provides one.
    Deferred,
}

/// Live waveform state: the bar window plus everything derived from the viewport.
///
/// One instance per drawing area. All calls are expected from the render loop.
#[derive(Debug)]
pub struct LiveWaveform {
    style: StyleConfig,
    window: BarWindow,
    viewport: Viewport,
    max_height: Option<f32>,
    gradient: Option<GradientShader>,
    last_update: Option<Instant>,
    pending: VecDeque<u32>,
}

impl Default for LiveWaveform {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

impl LiveWaveform {
    pub fn new(style: StyleConfig) -> Self {
        Self {
            style: style.validated(),
            window: BarWindow::default(),
            viewport: Viewport::default(),
            max_height: None,
            gradient: None,
            last_update: None,
            pending: VecDeque::new(),
        }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn window(&self) -> &BarWindow {
        &self.window
    }

    /// Heights currently in the window, oldest first.
    pub fn heights(&self) -> Vec<f32> {
        self.window.iter().map(|bar| bar.height).collect()
    }

    /// Number of amplitudes waiting for a viewport.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Tallest bar the current viewport allows, once it has a size.
    pub fn max_height(&self) -> Option<f32> {
        self.max_height
    }

    /// Feeds one polled amplitude, timestamped now.
    pub fn update(&mut self, amplitude: u32) -> UpdateOutcome {
        self.update_at(amplitude, Instant::now())
    }

    /// Feeds one polled amplitude observed at `now`.
    pub fn update_at(&mut self, amplitude: u32, now: Instant) -> UpdateOutcome {
        if !self.is_ready() {
            if self.pending.len() == MAX_PENDING_UPDATES {
                self.pending.pop_front();
            }
            self.pending.push_back(amplitude);
            return UpdateOutcome::Deferred;
        }

        let elapsed = self
            .last_update
            .map(|previous| now.saturating_duration_since(previous))
            .unwrap_or(REFERENCE_FRAME);
        self.push_amplitude(amplitude, elapsed);
        self.last_update = Some(now);
        UpdateOutcome::Applied
    }

    /// Polls `source` once and feeds the reading.
    ///
    /// Readings are rescaled from the source's own ceiling to the style's
    /// `max_reportable_amplitude`, so the source's loudest value is a full-height bar.
    pub fn poll_source<S: AmplitudeSource + ?Sized>(&mut self, source: &mut S) -> UpdateOutcome {
        let amplitude = rescale(
            source.poll(),
            source.max_reportable(),
            self.style.max_reportable_amplitude,
        );
        self.update(amplitude)
    }

    /// Drops every bar and any queued amplitudes.
    pub fn clear(&mut self) {
        self.window.clear();
        self.pending.clear();
        self.last_update = None;
    }

    /// Resets to a blank waveform for a new recording.
    pub fn recreate(&mut self) {
        self.clear();
        self.max_height = None;
        self.recompute_layout();
    }

    /// Adopts a new viewport size.
    ///
    /// Capacity, max height and the gradient are recomputed and the window is
    /// cleared, since every stored position is stale. Queued amplitudes are then
    /// replayed in arrival order.
    pub fn on_viewport_resized(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        if viewport == self.viewport && self.is_ready() {
            return;
        }
        self.viewport = viewport;
        self.window.clear();
        self.last_update = None;
        self.recompute_layout();
        self.flush_pending();
    }

    /// Replaces the style. The window is cleared as with a resize.
    pub fn set_style(&mut self, style: StyleConfig) {
        self.style = style.validated();
        self.window.clear();
        self.last_update = None;
        self.recompute_layout();
        self.flush_pending();
    }

    /// Draw primitives for the current window.
    pub fn frame(&self) -> Vec<DrawPrimitive> {
        scrolling_frame(&self.window, self.viewport, &self.style, self.gradient.as_ref())
    }

    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        surface.draw_all(&self.frame());
    }

    fn is_ready(&self) -> bool {
        self.viewport.has_size() && self.window.capacity() > 0
    }

    fn recompute_layout(&mut self) {
        if !self.viewport.has_size() {
            self.window.set_capacity(0);
            self.max_height = None;
            self.gradient = None;
            return;
        }
        self.window.set_capacity(capacity_for(
            self.viewport.width,
            self.style.bar_width,
            self.style.bar_spacing,
        ));
        self.max_height = Some(self.resolve_max_height());
        self.gradient = GradientShader::for_style(&self.style, self.viewport);
        tracing::debug!(
            "Live waveform layout: {}x{} capacity={} max_height={:?}",
            self.viewport.width,
            self.viewport.height,
            self.window.capacity(),
            self.max_height
        );
    }

    fn resolve_max_height(&self) -> f32 {
        let available = (self.viewport.height - 2.0 * self.style.top_bottom_padding).max(0.0);
        let wanted = self
            .style
            .max_height
            .unwrap_or(available * self.style.height_multiplier);
        wanted.min(available).max(0.0)
    }

    fn flush_pending(&mut self) {
        if !self.is_ready() || self.pending.is_empty() {
            return;
        }
        tracing::debug!("Replaying {} deferred amplitude(s)", self.pending.len());
        while let Some(amplitude) = self.pending.pop_front() {
            self.push_amplitude(amplitude, REFERENCE_FRAME);
        }
        self.last_update = Some(Instant::now());
    }

    fn push_amplitude(&mut self, amplitude: u32, elapsed: Duration) {
        let max_height = match self.max_height {
            Some(height) => height,
            None => {
                let height = self.resolve_max_height();
                self.max_height = Some(height);
                height
            }
        };
        let height = self.bar_height(amplitude, max_height, elapsed);
        self.window.push(VisualBar::new(height));
    }

    fn bar_height(&self, amplitude: u32, max_height: f32, elapsed: Duration) -> f32 {
        let min_height = self.style.min_height;
        let range = max_height - min_height;
        if !(range > 0.0) || self.style.max_reportable_amplitude == 0 {
            return min_height;
        }

        let scale = self.style.max_reportable_amplitude as f32 / range;
        let raw = (amplitude as f32 / scale) * self.style.height_multiplier;

        let value = match self.window.last() {
            Some(previous) if self.style.soft_transition => smooth(
                raw,
                previous.height - min_height,
                elapsed,
                self.style.smoothing_speed,
            ),
            _ => raw,
        };

        (value + min_height).clamp(min_height, max_height)
    }
}

/// Maps `amplitude` from `[0, from]` onto `[0, to]`.
fn rescale(amplitude: u32, from: u32, to: u32) -> u32 {
    if from == 0 || from == to {
        return amplitude;
    }
    let scaled = u64::from(amplitude.min(from)) * u64::from(to) / u64::from(from);
    scaled as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_heights(waveform: &LiveWaveform, expected: &[f32]) {
        let heights = waveform.heights();
        assert_eq!(heights.len(), expected.len());
        for (actual, expected) in heights.iter().zip(expected) {
            assert_abs_diff_eq!(*actual, *expected, epsilon = 1e-3);
        }
    }

    fn flat_style() -> StyleConfig {
        StyleConfig::default()
            .with_soft_transition(false)
            .with_heights(3.0, Some(103.0))
            .with_max_reportable_amplitude(22_760)
    }

    #[test]
    fn test_amplitudes_map_to_heights() {
        let mut waveform = LiveWaveform::new(flat_style());
        // step 3 -> capacity 4; 115 - 2 * 6 padding leaves exactly 103.
        waveform.on_viewport_resized(12.0, 115.0);
        assert_eq!(waveform.window().capacity(), 4);

        for amplitude in [0, 10_000, 22_760, 5_000] {
            assert_eq!(waveform.update(amplitude), UpdateOutcome::Applied);
        }

        let heights = waveform.heights();
        assert_eq!(heights.len(), 4);
        for (actual, expected) in heights.iter().zip([3.0, 47.3, 103.0, 25.1]) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 0.5);
        }
    }

    #[test]
    fn test_small_viewport_keeps_latest_bars() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(6.0, 115.0);
        assert_eq!(waveform.window().capacity(), 2);

        for amplitude in [100, 200, 300] {
            waveform.update(amplitude);
        }

        let mut expected = LiveWaveform::new(flat_style());
        expected.on_viewport_resized(100.0, 115.0);
        expected.update(200);
        expected.update(300);

        assert_eq!(waveform.heights(), expected.heights());
    }

    #[test]
    fn test_updates_before_layout_are_replayed_in_order() {
        let mut waveform = LiveWaveform::new(flat_style());
        assert_eq!(waveform.update(22_760), UpdateOutcome::Deferred);
        assert_eq!(waveform.update(0), UpdateOutcome::Deferred);
        assert_eq!(waveform.pending_len(), 2);
        assert!(waveform.frame().is_empty());

        waveform.on_viewport_resized(12.0, 115.0);

        assert_eq!(waveform.pending_len(), 0);
        assert_heights(&waveform, &[103.0, 3.0]);
    }

    #[test]
    fn test_smoothing_applies_from_second_bar() {
        let style = flat_style().with_soft_transition(true);
        let mut waveform = LiveWaveform::new(style);
        waveform.on_viewport_resized(12.0, 115.0);

        let start = Instant::now();
        waveform.update_at(0, start);
        waveform.update_at(22_760, start + Duration::from_millis(75));
        waveform.update_at(22_760, start + Duration::from_millis(75));

        let heights = waveform.heights();
        assert_abs_diff_eq!(heights[0], 3.0);
        assert_abs_diff_eq!(heights[1], 3.0 + 100.0 / 2.2, epsilon = 1e-3);
        // no time passed, no movement
        assert_abs_diff_eq!(heights[2], heights[1], epsilon = 1e-3);
    }

    #[test]
    fn test_resize_clears_window() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(30.0, 115.0);
        waveform.update(1_000);
        waveform.update(2_000);

        waveform.on_viewport_resized(60.0, 115.0);

        assert!(waveform.window().is_empty());
        assert_eq!(waveform.window().capacity(), 20);
    }

    #[test]
    fn test_auto_max_height_follows_viewport() {
        let style = StyleConfig::default().with_heights(3.0, None);
        let mut waveform = LiveWaveform::new(style);
        waveform.on_viewport_resized(30.0, 62.0);
        assert_eq!(waveform.max_height(), Some(50.0));

        let tall = StyleConfig::default().with_heights(3.0, Some(500.0));
        waveform.set_style(tall);
        assert_eq!(waveform.max_height(), Some(50.0));
    }

    #[test]
    fn test_degenerate_height_range_uses_min_height() {
        let style = flat_style().with_padding(0.0);
        let mut waveform = LiveWaveform::new(style);
        waveform.on_viewport_resized(12.0, 3.0);
        waveform.update(22_760);
        assert_eq!(waveform.heights(), vec![3.0]);
    }

    #[test]
    fn test_poll_source_reads_in_order() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(12.0, 115.0);
        let mut source = vec![22_760_u32, 0].into_iter();

        waveform.poll_source(&mut source);
        waveform.poll_source(&mut source);
        waveform.poll_source(&mut source);

        assert_heights(&waveform, &[103.0, 3.0, 3.0]);
    }

    #[test]
    fn test_source_ceiling_maps_to_full_height() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(12.0, 115.0);
        let mut meter = crate::recording::PeakMeter::new();

        for peak in [23_000i16, 28_000, i16::MAX] {
            meter.record(&[peak]);
            waveform.poll_source(&mut meter);
        }

        let heights = waveform.heights();
        assert!(heights[0] < heights[1]);
        assert!(heights[1] < heights[2]);
        assert_abs_diff_eq!(heights[2], 103.0, epsilon = 1e-3);
        assert_abs_diff_eq!(heights[0], 3.0 + 100.0 * 23_000.0 / 32_767.0, epsilon = 0.5);
    }

    #[test]
    fn test_rescale_bounds() {
        assert_eq!(rescale(32_767, 32_767, 22_760), 22_760);
        assert_eq!(rescale(0, 32_767, 22_760), 0);
        assert_eq!(rescale(40_000, 32_767, 22_760), 22_760);
        assert_eq!(rescale(500, 0, 22_760), 500);
        assert_eq!(rescale(500, 22_760, 22_760), 500);
    }

    #[test]
    fn test_recreate_starts_a_blank_take() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(12.0, 115.0);
        waveform.update(10_000);
        waveform.update(20_000);

        waveform.recreate();
        assert!(waveform.window().is_empty());
        assert_eq!(waveform.max_height(), Some(103.0));

        assert_eq!(waveform.update(22_760), UpdateOutcome::Applied);
        assert_heights(&waveform, &[103.0]);
    }

    #[test]
    fn test_clear_drops_bars() {
        let mut waveform = LiveWaveform::new(flat_style());
        waveform.on_viewport_resized(12.0, 115.0);
        waveform.update(500);
        waveform.clear();
        assert!(waveform.window().is_empty());
        assert!(waveform.frame().iter().all(|p| matches!(p, DrawPrimitive::Line { .. })));
    }
}
