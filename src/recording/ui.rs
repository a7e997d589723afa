//! Terminal user interface for recording with a live waveform.
//!
//! The waveform fills the screen above a one-line footer that shows the recording
//! state, the elapsed time and the key bindings.

use crate::ui::surface::{canvas_viewport, CanvasSurface};
use crate::waveform::{AmplitudeSource, LiveWaveform, StyleConfig, UpdateOutcome};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

const BACKGROUND: Color = Color::Rgb(0, 0, 0);
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input command during recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    /// No key, or one without a binding
    Continue,
    /// Stop and keep the recording (Enter)
    Save,
    /// Stop and throw the recording away (Escape, 'q', Ctrl+C)
    Discard,
    /// Pause/resume (Space)
    TogglePause,
    /// Throw away what was captured and start a new take ('r')
    Restart,
}

impl RecordingCommand {
    pub fn from_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Enter => RecordingCommand::Save,
            KeyCode::Char('q') | KeyCode::Esc => RecordingCommand::Discard,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                RecordingCommand::Discard
            }
            KeyCode::Char(' ') => RecordingCommand::TogglePause,
            KeyCode::Char('r') => RecordingCommand::Restart,
            _ => RecordingCommand::Continue,
        }
    }
}

/// Splits the screen into the waveform area and the footer line.
fn split_screen(area: Rect) -> (Rect, Rect) {
    let footer_height = area.height.min(1);
    let waveform = Rect {
        height: area.height - footer_height,
        ..area
    };
    let footer = Rect {
        y: area.y + waveform.height,
        height: footer_height,
        ..area
    };
    (waveform, footer)
}

fn footer_line(is_paused: bool, elapsed: Duration) -> Line<'static> {
    let secs = elapsed.as_secs();
    let indicator = if is_paused {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● ", Style::default().fg(Color::Red))
    };
    Line::from(vec![
        indicator,
        Span::raw(format!("{}:{:02}", secs / 60, secs % 60)),
        Span::styled(
            "   ↵ save, space pause, r restart, esc/q discard",
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Terminal UI showing the live waveform while recording.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    waveform: LiveWaveform,
    pub is_paused: bool,
}

impl RecorderTui {
    /// Enters the alternate screen and sizes the waveform to the terminal.
    ///
    /// # Errors
    /// - If raw mode or the alternate screen cannot be entered
    pub fn new(style: StyleConfig) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let mut tui = RecorderTui {
            terminal,
            waveform: LiveWaveform::new(style),
            is_paused: false,
        };
        tui.sync_viewport()?;
        Ok(tui)
    }

    /// Resizes the waveform if the terminal changed size.
    fn sync_viewport(&mut self) -> anyhow::Result<()> {
        let size = self.terminal.size()?;
        let (area, _) = split_screen(Rect::new(0, 0, size.width, size.height));
        let viewport = canvas_viewport(area);
        if viewport != self.waveform.viewport() {
            tracing::debug!("Waveform viewport {}x{}", viewport.width, viewport.height);
            self.waveform
                .on_viewport_resized(viewport.width, viewport.height);
        }
        Ok(())
    }

    /// Feeds the next peak from `source` into the waveform.
    ///
    /// While paused the peak is drained and dropped; returns `None` then.
    pub fn sample<S: AmplitudeSource + ?Sized>(&mut self, source: &mut S) -> Option<UpdateOutcome> {
        if self.is_paused {
            source.poll();
            return None;
        }
        Some(self.waveform.poll_source(source))
    }

    /// Blanks the waveform for a new take.
    pub fn restart(&mut self) {
        self.waveform.recreate();
    }

    /// Draws the waveform and footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, elapsed: Duration) -> anyhow::Result<()> {
        self.sync_viewport()?;
        let waveform = &self.waveform;
        let is_paused = self.is_paused;

        self.terminal.draw(|frame| {
            let (waveform_area, footer_area) = split_screen(frame.area());
            let full_area = frame.area();
            frame.buffer_mut().set_style(full_area, Style::default().bg(BACKGROUND));

            let mut surface = CanvasSurface::new(waveform_area);
            waveform.render(&mut surface);
            frame.render_widget(&surface, waveform_area);

            let footer = Paragraph::new(footer_line(is_paused, elapsed))
                .style(Style::default().fg(FOOTER_FG).bg(BACKGROUND));
            frame.render_widget(footer, footer_area);
        })?;
        Ok(())
    }

    /// Waits up to `timeout` for a key and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<RecordingCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = RecordingCommand::from_key(key);
                if command != RecordingCommand::Continue {
                    tracing::debug!("Key {:?}: {:?}", key.code, command);
                }
                if command == RecordingCommand::TogglePause {
                    self.is_paused = !self.is_paused;
                }
                return Ok(command);
            }
        }
        Ok(RecordingCommand::Continue)
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If raw mode cannot be disabled or the cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
