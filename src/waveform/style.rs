//! Immutable render configuration for waveform views.
//!
//! A [`StyleConfig`] is built by the host (usually from the `[waveform]` section of the
//! config file) and handed to a view. Changing the look means building a new value
//! with one of the `with_*` methods and passing it back in; views never share a
//! mutable style.

use super::sample::DEFAULT_MAX_REPORTABLE_AMPLITUDE;
use super::smoothing::DEFAULT_SMOOTHING_SPEED;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allowed range for [`StyleConfig::height_multiplier`].
pub const HEIGHT_MULTIPLIER_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

/// An opaque RGB color, written as `#rrggbb` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation toward `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid color '{s}'. Expected '#rrggbb'"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("Invalid color '{s}': {e}"))
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Vertical anchoring of bars inside the viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Bars grow symmetrically around the vertical center
    #[default]
    Center,
    /// Bars grow upward from the bottom padding line
    Bottom,
    /// Bars hang down from the top padding line
    Top,
}

/// Horizontal flow of time across the viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Oldest on the left, newest on the right
    #[default]
    Forward,
    /// Mirrored: newest on the left
    Reverse,
}

/// Render configuration consumed read-only by the render model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Width of one bar in viewport units
    pub bar_width: f32,
    /// Gap between neighbouring bars
    pub bar_spacing: f32,
    /// Rounded bar ends instead of square ones
    pub rounded_corners: bool,
    /// Smallest height a bar is drawn with, even for silence
    pub min_height: f32,
    /// Tallest bar; `None` derives it from the viewport height
    pub max_height: Option<f32>,
    /// Scales bar heights; clamped to 0.5..=2.0
    pub height_multiplier: f32,
    pub alignment: Alignment,
    pub direction: Direction,
    /// Flat bar color, used when no gradient is set
    pub color: Rgb,
    /// Two-stop vertical gradient (top, bottom) spanning the viewport
    pub gradient: Option<(Rgb, Rgb)>,
    /// Draw a wider translucent halo under each bar
    pub glow_enabled: bool,
    /// Color of the live "now" line; `None` hides it
    pub now_line_color: Option<Rgb>,
    /// Dim older bars
    pub fade_by_age_enabled: bool,
    /// Smooth live heights between consecutive samples
    pub soft_transition: bool,
    /// Opacity of the oldest bar when fading, 0.0..=1.0
    pub min_alpha: f32,
    /// Opacity of the newest bar when fading, 0.0..=1.0
    pub max_alpha: f32,
    /// Space kept free above and below the bars
    pub top_bottom_padding: f32,
    /// Horizontal position of the "now" line as a fraction of the width
    pub anchor_fraction: f32,
    /// Amplitude that maps to a full-height bar in live mode
    pub max_reportable_amplitude: u32,
    /// Divisor of each smoothing step; larger is smoother
    pub smoothing_speed: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            bar_width: 2.0,
            bar_spacing: 1.0,
            rounded_corners: false,
            min_height: 3.0,
            max_height: None,
            height_multiplier: 1.0,
            alignment: Alignment::Center,
            direction: Direction::Forward,
            color: Rgb::new(0x62, 0x00, 0xee),
            gradient: Some((Rgb::new(0xfd, 0x1d, 0x64), Rgb::new(0xf5, 0xba, 0x62))),
            glow_enabled: false,
            now_line_color: Some(Rgb::new(0xaf, 0x34, 0x44)),
            fade_by_age_enabled: true,
            soft_transition: true,
            min_alpha: 100.0 / 255.0,
            max_alpha: 1.0,
            top_bottom_padding: 6.0,
            anchor_fraction: 0.5,
            max_reportable_amplitude: DEFAULT_MAX_REPORTABLE_AMPLITUDE,
            smoothing_speed: DEFAULT_SMOOTHING_SPEED,
        }
    }
}

impl StyleConfig {
    /// Returns a copy with every field forced into its valid range.
    ///
    /// Config files are user-edited, so out-of-range values are repaired rather than
    /// rejected.
    pub fn validated(mut self) -> Self {
        let defaults = StyleConfig::default();

        self.bar_width = positive_or(self.bar_width, defaults.bar_width);
        self.bar_spacing = non_negative_or(self.bar_spacing, defaults.bar_spacing);
        self.min_height = non_negative_or(self.min_height, defaults.min_height);
        self.max_height = self
            .max_height
            .filter(|h| h.is_finite())
            .map(|h| h.max(self.min_height));
        self.height_multiplier = if self.height_multiplier.is_finite() {
            self.height_multiplier
                .clamp(*HEIGHT_MULTIPLIER_RANGE.start(), *HEIGHT_MULTIPLIER_RANGE.end())
        } else {
            defaults.height_multiplier
        };
        self.min_alpha = unit_or(self.min_alpha, defaults.min_alpha);
        self.max_alpha = unit_or(self.max_alpha, defaults.max_alpha);
        if self.min_alpha > self.max_alpha {
            std::mem::swap(&mut self.min_alpha, &mut self.max_alpha);
        }
        self.top_bottom_padding =
            non_negative_or(self.top_bottom_padding, defaults.top_bottom_padding);
        self.anchor_fraction = unit_or(self.anchor_fraction, defaults.anchor_fraction);
        if !(self.smoothing_speed.is_finite() && self.smoothing_speed > 0.0) {
            self.smoothing_speed = defaults.smoothing_speed;
        }
        self
    }

    pub fn with_bar_width(self, bar_width: f32) -> Self {
        Self { bar_width, ..self }.validated()
    }

    pub fn with_bar_spacing(self, bar_spacing: f32) -> Self {
        Self { bar_spacing, ..self }.validated()
    }

    pub fn with_height_multiplier(self, height_multiplier: f32) -> Self {
        Self {
            height_multiplier,
            ..self
        }
        .validated()
    }

    pub fn with_heights(self, min_height: f32, max_height: Option<f32>) -> Self {
        Self {
            min_height,
            max_height,
            ..self
        }
        .validated()
    }

    pub fn with_alignment(self, alignment: Alignment) -> Self {
        Self { alignment, ..self }
    }

    pub fn with_direction(self, direction: Direction) -> Self {
        Self { direction, ..self }
    }

    /// Sets a flat color and drops any gradient.
    pub fn with_color(self, color: Rgb) -> Self {
        Self {
            color,
            gradient: None,
            ..self
        }
    }

    pub fn with_gradient(self, top: Rgb, bottom: Rgb) -> Self {
        Self {
            gradient: Some((top, bottom)),
            ..self
        }
    }

    pub fn with_glow(self, glow_enabled: bool) -> Self {
        Self {
            glow_enabled,
            ..self
        }
    }

    pub fn with_fade_by_age(self, fade_by_age_enabled: bool) -> Self {
        Self {
            fade_by_age_enabled,
            ..self
        }
    }

    pub fn with_soft_transition(self, soft_transition: bool) -> Self {
        Self {
            soft_transition,
            ..self
        }
    }

    pub fn with_max_reportable_amplitude(self, max_reportable_amplitude: u32) -> Self {
        Self {
            max_reportable_amplitude,
            ..self
        }
    }

    pub fn with_padding(self, top_bottom_padding: f32) -> Self {
        Self {
            top_bottom_padding,
            ..self
        }
        .validated()
    }
}

fn non_negative_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn unit_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}
