//! Playback screen: the recording's waveform with the played part highlighted.

use super::session::{Playback, SKIP_STEP};
use crate::history::{format_duration, Recording};
use crate::ui::surface::{canvas_viewport, CanvasSurface};
use crate::waveform::{FileWaveform, LoadStatus};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

const BACKGROUND: Color = Color::Rgb(0, 0, 0);
const TITLE_FG: Color = Color::Rgb(255, 255, 255);
const STATUS_FG: Color = Color::Rgb(185, 207, 212);
const FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// User input command during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// No key, or one without a binding
    Continue,
    /// Stop playback (Escape, 'q', Enter, Ctrl+C)
    Stop,
    /// Pause/resume (Space)
    TogglePause,
    /// Jump back (Left, 'h')
    SkipBackward,
    /// Jump ahead (Right, 'l')
    SkipForward,
}

impl PlaybackCommand {
    pub fn from_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => PlaybackCommand::Stop,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                PlaybackCommand::Stop
            }
            KeyCode::Char(' ') => PlaybackCommand::TogglePause,
            KeyCode::Left | KeyCode::Char('h') => PlaybackCommand::SkipBackward,
            KeyCode::Right | KeyCode::Char('l') => PlaybackCommand::SkipForward,
            _ => PlaybackCommand::Continue,
        }
    }
}

/// What the status row shows besides the load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransportState {
    elapsed: Duration,
    duration: Duration,
    paused: bool,
    can_control: bool,
}

/// Title row, waveform, status row.
fn split_screen(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area)
}

fn status_line(transport: TransportState, load: Option<LoadStatus>) -> Line<'static> {
    let indicator = if transport.paused {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("▶ ", Style::default().fg(Color::Green))
    };
    let mut spans = vec![
        indicator,
        Span::raw(format!(
            "{} / {}",
            format_duration(transport.elapsed),
            format_duration(transport.duration)
        )),
    ];
    match load {
        None => spans.push(Span::styled(
            "   loading waveform…",
            Style::default().fg(Color::DarkGray),
        )),
        Some(LoadStatus::Failed) => spans.push(Span::styled(
            "   waveform unavailable",
            Style::default().fg(Color::Yellow),
        )),
        Some(_) => {}
    }
    let hint = if transport.can_control {
        format!(
            "   space pause, ←/→ {}s, q stop",
            SKIP_STEP.as_secs()
        )
    } else {
        "   q stop".to_string()
    };
    spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

/// Full-screen view shown while a recording plays.
pub struct PlaybackTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    waveform: FileWaveform,
    /// Outcome of the waveform load, once known
    load_status: Option<LoadStatus>,
}

impl PlaybackTui {
    /// Enters the alternate screen and starts extracting the waveform of `recording`.
    ///
    /// Must be called inside a tokio runtime; extraction runs on the blocking pool.
    pub fn new(mut waveform: FileWaveform, recording: &Recording) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let name = recording.file_name.clone();
        waveform.load_file(recording.file_path.clone(), move |status| {
            tracing::debug!("Waveform of {} finished loading: {:?}", name, status);
        });

        Ok(Self {
            terminal,
            waveform,
            load_status: None,
        })
    }

    fn sync_viewport(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        let [_, area, _] = split_screen(Rect::new(0, 0, size.width, size.height));
        let viewport = canvas_viewport(area);
        if viewport != self.waveform.viewport() {
            self.waveform
                .on_viewport_resized(viewport.width, viewport.height);
        }
        Ok(())
    }

    /// Draws until playback ends or the user stops it.
    ///
    /// Space pauses, the arrow keys skip. Returns true if the user stopped playback
    /// early.
    pub fn run(&mut self, recording: &Recording, playback: &mut Playback) -> Result<bool> {
        let title = format!(
            " {}  ·  {}  ·  {}",
            recording.file_name,
            recording.created_at.format("%Y-%m-%d %H:%M"),
            playback.backend_name()
        );
        loop {
            if let Some(status) = self.waveform.poll_loaded() {
                if status == LoadStatus::Failed {
                    tracing::warn!("Could not extract waveform of {}", recording.file_name);
                }
                self.load_status = Some(status);
            }
            self.waveform.set_progress(playback.progress());
            let transport = TransportState {
                elapsed: playback.elapsed(),
                duration: playback.duration(),
                paused: playback.is_paused(),
                can_control: playback.can_control(),
            };
            self.draw(&title, transport)?;

            if playback.is_finished() {
                return Ok(false);
            }
            if event::poll(FRAME_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    match PlaybackCommand::from_key(key) {
                        PlaybackCommand::Continue => {}
                        PlaybackCommand::Stop => {
                            playback.stop();
                            return Ok(true);
                        }
                        PlaybackCommand::TogglePause => playback.toggle_pause(),
                        PlaybackCommand::SkipBackward => playback.skip(false),
                        PlaybackCommand::SkipForward => playback.skip(true),
                    }
                }
            }
        }
    }

    fn draw(&mut self, title: &str, transport: TransportState) -> Result<()> {
        self.sync_viewport()?;
        let waveform = &self.waveform;
        let load_status = self.load_status;

        self.terminal.draw(|frame| {
            let [title_area, waveform_area, status_area] = split_screen(frame.area());
            let full_area = frame.area();
            frame
                .buffer_mut()
                .set_style(full_area, Style::default().bg(BACKGROUND));

            let title = Paragraph::new(title)
                .style(Style::default().fg(TITLE_FG).add_modifier(Modifier::BOLD));
            frame.render_widget(title, title_area);

            let mut surface = CanvasSurface::new(waveform_area);
            waveform.render(&mut surface);
            frame.render_widget(&surface, waveform_area);

            let status = Paragraph::new(status_line(transport, load_status))
                .style(Style::default().fg(STATUS_FG));
            frame.render_widget(status, status_area);
        })?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> Result<()> {
        self.waveform.clear();
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for PlaybackTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_layout_leaves_rows_for_title_and_status() {
        let [title, waveform, status] = split_screen(Rect::new(0, 0, 40, 10));
        assert_eq!(title, Rect::new(0, 0, 40, 1));
        assert_eq!(waveform, Rect::new(0, 1, 40, 8));
        assert_eq!(status, Rect::new(0, 9, 40, 1));
    }

    fn transport(elapsed: u64, duration: u64) -> TransportState {
        TransportState {
            elapsed: Duration::from_secs(elapsed),
            duration: Duration::from_secs(duration),
            paused: false,
            can_control: true,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Char(' '))), PlaybackCommand::TogglePause);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Left)), PlaybackCommand::SkipBackward);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Right)), PlaybackCommand::SkipForward);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Char('h'))), PlaybackCommand::SkipBackward);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Char('l'))), PlaybackCommand::SkipForward);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Esc)), PlaybackCommand::Stop);
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Char('q'))), PlaybackCommand::Stop);
        assert_eq!(
            PlaybackCommand::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            PlaybackCommand::Stop
        );
        assert_eq!(PlaybackCommand::from_key(key(KeyCode::Char('x'))), PlaybackCommand::Continue);
    }

    #[test]
    fn test_status_reports_load_state() {
        let loading = status_line(transport(3, 75), None);
        assert!(text(&loading).starts_with("▶ 0:03 / 1:15"));
        assert!(text(&loading).contains("loading"));

        let failed = status_line(transport(0, 0), Some(LoadStatus::Failed));
        assert!(text(&failed).contains("unavailable"));

        let loaded = status_line(transport(0, 0), Some(LoadStatus::Loaded(500)));
        assert!(!text(&loaded).contains("loading"));
    }

    #[test]
    fn test_status_shows_pause_and_controls() {
        let paused = TransportState {
            paused: true,
            ..transport(10, 20)
        };
        let line = text(&status_line(paused, Some(LoadStatus::Loaded(500))));
        assert!(line.starts_with("⏸ 0:10 / 0:20"));
        assert!(line.contains("←/→ 5s"));

        let external = TransportState {
            can_control: false,
            ..transport(10, 20)
        };
        let line = text(&status_line(external, Some(LoadStatus::Loaded(500))));
        assert!(!line.contains("space pause"));
        assert!(line.contains("q stop"));
    }
}
