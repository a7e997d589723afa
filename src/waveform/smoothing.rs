//! Damped transition between consecutive live bar heights.

use std::time::Duration;

/// Default divisor applied to each step; larger is smoother.
pub const DEFAULT_SMOOTHING_SPEED: f32 = 2.2;

/// Frame interval at which a full smoothing step is taken.
pub const REFERENCE_FRAME: Duration = Duration::from_millis(75);

/// Moves `previous` toward `target` by a fraction of the gap.
///
/// The step is `(target - previous) / speed`, scaled by how much of a reference
/// frame has elapsed. The scale is capped at one frame so long gaps (a stalled poll,
/// a suspended terminal) never overshoot.
///
/// # Panics
/// If `speed` is not positive.
pub fn smooth(target: f32, previous: f32, elapsed: Duration, speed: f32) -> f32 {
    assert!(speed > 0.0, "smoothing speed must be positive");
    let scale = frame_scale(elapsed);
    previous + ((target - previous) / speed) * scale
}

/// Fraction of a reference frame covered by `elapsed`, in `[0, 1]`.
pub fn frame_scale(elapsed: Duration) -> f32 {
    let elapsed_ms = elapsed.as_secs_f32() * 1000.0;
    (elapsed_ms / REFERENCE_FRAME.as_millis() as f32).clamp(0.0, 1.0)
}
