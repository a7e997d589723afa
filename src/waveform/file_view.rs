//! Static waveform of a stored recording, with playback progress.

use super::decode::{DecodeError, ErrorKind};
use super::layout::static_layout;
use super::loader::{LoadStatus, WaveformLoader};
use super::render::{
    bar_paint, geometry, push_bar, DrawPrimitive, DrawSurface, GradientShader, Paint, Viewport,
};
use super::style::{Rgb, StyleConfig};
use super::window::VisualBar;
use std::path::PathBuf;

/// Default number of amplitude values extracted from a file.
pub const DEFAULT_TARGET_SAMPLE_COUNT: usize = 500;

/// Default color of the already-played part of the waveform.
pub const DEFAULT_PROGRESS_COLOR: Rgb = Rgb::new(0x03, 0xda, 0xc5);

type CompletionCallback = Box<dyn FnOnce(LoadStatus) + Send>;

/// File-mode waveform: one load, displayed across the full width.
///
/// Values are loaded off-thread through [`FileWaveform::load_file`] and picked up by
/// [`FileWaveform::poll_loaded`] on the render loop.
pub struct FileWaveform {
    style: StyleConfig,
    viewport: Viewport,
    values: Vec<f32>,
    progress: f32,
    progress_color: Rgb,
    gradient: Option<GradientShader>,
    loader: WaveformLoader,
    on_complete: Option<CompletionCallback>,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for FileWaveform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWaveform")
            .field("viewport", &self.viewport)
            .field("values", &self.values.len())
            .field("progress", &self.progress)
            .field("source", &self.source)
            .field("loader", &self.loader)
            .finish()
    }
}

impl FileWaveform {
    pub fn new(style: StyleConfig, target_sample_count: usize) -> Self {
        Self::with_loader(style, WaveformLoader::new(target_sample_count.max(1)))
    }

    pub fn with_loader(style: StyleConfig, loader: WaveformLoader) -> Self {
        Self {
            style: style.validated(),
            viewport: Viewport::default(),
            values: Vec::new(),
            progress: 0.0,
            progress_color: DEFAULT_PROGRESS_COLOR,
            gradient: None,
            loader,
            on_complete: None,
            source: None,
        }
    }

    pub fn with_progress_color(mut self, color: Rgb) -> Self {
        self.progress_color = color;
        self
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Starts loading `path`; `on_complete` runs from [`FileWaveform::poll_loaded`].
    ///
    /// A load already in flight is cancelled and its callback receives
    /// [`LoadStatus::Cancelled`].
    pub fn load_file<F>(&mut self, path: impl Into<PathBuf>, on_complete: F)
    where
        F: FnOnce(LoadStatus) + Send + 'static,
    {
        self.cancel_pending();
        let path = path.into();
        self.values.clear();
        self.progress = 0.0;
        self.loader.start(path.clone());
        self.source = Some(path);
        self.on_complete = Some(Box::new(on_complete));
    }

    /// Applies a finished load, if one has arrived, and runs its callback.
    pub fn poll_loaded(&mut self) -> Option<LoadStatus> {
        let outcome = self.loader.poll()?;
        Some(self.complete(outcome))
    }

    /// Waits for the in-flight load and applies it.
    pub async fn wait_loaded(&mut self) -> Option<LoadStatus> {
        let outcome = self.loader.finished().await?;
        Some(self.complete(outcome))
    }

    /// Cancels any load and drops the displayed values.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.values.clear();
        self.progress = 0.0;
        self.source = None;
    }

    /// Shows already-extracted values without decoding anything.
    pub fn set_values(&mut self, values: Vec<f32>) {
        self.cancel_pending();
        self.values = values;
    }

    /// Playback position as a fraction of the file, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn on_viewport_resized(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.gradient = GradientShader::for_style(&self.style, self.viewport);
    }

    /// Draw primitives spanning the full viewport width once.
    pub fn frame(&self) -> Vec<DrawPrimitive> {
        let mut out = Vec::new();
        if !self.viewport.has_size() || self.values.is_empty() {
            return out;
        }

        let min_height = self.style.min_height;
        let available = (self.viewport.height - 2.0 * self.style.top_bottom_padding).max(0.0);
        let max_height = self
            .style
            .max_height
            .unwrap_or(available * self.style.height_multiplier)
            .min(available)
            .max(min_height);
        let progress_x = self.progress * self.viewport.width;

        let slots = static_layout(self.values.len(), self.viewport.width, self.style.bar_spacing);
        for (slot, value) in slots.iter().zip(&self.values) {
            let height = min_height + value.clamp(0.0, 1.0) * (max_height - min_height);
            let rect = geometry(
                slot.x,
                slot.width,
                height,
                self.style.alignment,
                self.viewport.height,
                self.style.top_bottom_padding,
            );
            let paint = if self.progress > 0.0 && rect.center_x() <= progress_x {
                Paint::Solid(self.progress_color)
            } else {
                bar_paint(&VisualBar::new(height), &self.style, self.gradient.as_ref())
            };
            push_bar(&mut out, rect, paint, 1.0, &self.style);
        }
        out
    }

    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        surface.draw_all(&self.frame());
    }

    fn complete(&mut self, outcome: Result<Vec<f32>, DecodeError>) -> LoadStatus {
        let status = match outcome {
            Ok(values) => {
                let count = values.len();
                self.values = values;
                tracing::info!("Waveform loaded with {} values", count);
                LoadStatus::Loaded(count)
            }
            Err(err) => {
                self.values.clear();
                match err.kind() {
                    ErrorKind::Cancelled => LoadStatus::Cancelled,
                    ErrorKind::Input | ErrorKind::Resource => {
                        tracing::warn!("Waveform load failed: {}", err);
                        LoadStatus::Failed
                    }
                }
            }
        };
        if let Some(callback) = self.on_complete.take() {
            callback(status);
        }
        status
    }

    fn cancel_pending(&mut self) {
        if self.loader.is_loading() {
            self.loader.cancel();
        }
        if let Some(callback) = self.on_complete.take() {
            callback(LoadStatus::Cancelled);
        }
    }
}
