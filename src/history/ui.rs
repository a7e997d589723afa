//! Interactive recordings browser.
//!
//! Lists stored recordings newest first. Enter plays the selected one, `d` then `y`
//! deletes it.

use super::storage::{format_duration, format_size, Recording, RecordingStore};
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph},
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const DETAIL_FG: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const WARNING_BG: Color = Color::Rgb(175, 52, 68);

const NOTIFICATION_TIME: Duration = Duration::from_millis(800);

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserAction {
    Exit,
    Play(Recording),
    Delete(Recording),
}

/// Selection and key handling, kept apart from the terminal.
#[derive(Debug, Default)]
pub struct BrowserState {
    entries: Vec<Recording>,
    list_state: ListState,
    /// Set after `d`; the next key confirms or cancels
    confirming_delete: bool,
}

impl BrowserState {
    pub fn new(entries: Vec<Recording>) -> Self {
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            entries,
            list_state,
            confirming_delete: false,
        }
    }

    pub fn entries(&self) -> &[Recording] {
        &self.entries
    }

    pub fn selected(&self) -> Option<&Recording> {
        self.list_state
            .selected()
            .and_then(|index| self.entries.get(index))
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    fn select_previous(&mut self) {
        if let Some(index) = self.list_state.selected() {
            self.list_state.select(Some(index.saturating_sub(1)));
        }
    }

    fn select_next(&mut self) {
        if let Some(index) = self.list_state.selected() {
            let last = self.entries.len().saturating_sub(1);
            self.list_state.select(Some((index + 1).min(last)));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BrowserAction> {
        if self.confirming_delete {
            self.confirming_delete = false;
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('d') => {
                    self.selected().cloned().map(BrowserAction::Delete)
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(BrowserAction::Exit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Enter => self.selected().cloned().map(BrowserAction::Play),
            KeyCode::Char('d') | KeyCode::Delete => {
                self.confirming_delete = self.selected().is_some();
                None
            }
            _ => None,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.select_previous(),
            MouseEventKind::ScrollDown => self.select_next(),
            _ => {}
        }
    }

    /// Drops a deleted recording and keeps the selection in range.
    pub fn remove(&mut self, id: i64) {
        self.entries.retain(|recording| recording.id != id);
        let selected = match (self.list_state.selected(), self.entries.len()) {
            (_, 0) => None,
            (Some(index), len) => Some(index.min(len - 1)),
            (None, _) => Some(0),
        };
        self.list_state.select(selected);
    }
}

fn recording_item(position: usize, recording: &Recording) -> ListItem<'static> {
    let title = Line::from(vec![
        Span::styled(format!("#{position:<3} "), Style::default().fg(DETAIL_FG)),
        Span::styled(
            recording.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            Style::default().fg(FG),
        ),
        Span::styled(
            format!(
                "   {}   {}",
                format_duration(recording.duration),
                format_size(recording.file_size)
            ),
            Style::default().fg(FG),
        ),
    ]);
    let detail = Line::styled(
        format!("     {}", recording.file_name),
        Style::default().fg(DETAIL_FG),
    );
    ListItem::new(vec![title, detail])
}

/// Full-screen browser over the recordings in a [`RecordingStore`].
pub struct RecordingBrowser {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: BrowserState,
    notification: Option<(String, Instant)>,
}

impl RecordingBrowser {
    pub fn new(entries: Vec<Recording>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            state: BrowserState::new(entries),
            notification: None,
        })
    }

    /// Runs until the user exits or picks a recording to play.
    ///
    /// Deletions are applied to `store` right away.
    pub fn run(&mut self, store: &mut RecordingStore) -> Result<Option<Recording>> {
        tracing::debug!(
            "Recordings browser started with {} entries",
            self.state.entries().len()
        );

        let chosen = loop {
            if self.state.entries().is_empty() {
                break None;
            }
            self.draw()?;

            if let Some((_, shown_at)) = self.notification {
                if shown_at.elapsed() >= NOTIFICATION_TIME {
                    self.notification = None;
                }
            }

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => match self.state.handle_key(key) {
                    Some(BrowserAction::Exit) => break None,
                    Some(BrowserAction::Play(recording)) => break Some(recording),
                    Some(BrowserAction::Delete(recording)) => {
                        store.delete(recording.id)?;
                        self.state.remove(recording.id);
                        self.notification = Some(("Recording deleted".to_string(), Instant::now()));
                    }
                    None => {}
                },
                Event::Mouse(mouse) => self.state.handle_mouse(mouse),
                _ => {}
            }
        };

        self.cleanup()?;
        Ok(chosen)
    }

    fn draw(&mut self) -> Result<()> {
        let notification = self.notification.clone();
        let state = &mut self.state;

        self.terminal.draw(|frame| {
            let area = frame.area();

            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG));
            frame.render_widget(&padding_block, area);
            let inner_area = padding_block.inner(area);

            let [header_area, list_area, footer_area] = Layout::vertical([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .areas(inner_area);

            let header = Paragraph::new(format!(" quickrec · {} recordings", state.entries().len()))
                .style(Style::default().fg(FG).add_modifier(Modifier::BOLD));
            frame.render_widget(header, header_area);

            let items: Vec<ListItem> = state
                .entries()
                .iter()
                .enumerate()
                .map(|(index, recording)| recording_item(index + 1, recording))
                .collect();
            let list = List::new(items)
                .block(
                    Block::default()
                        .title(" Recordings ")
                        .borders(Borders::ALL)
                        .style(Style::default().fg(FG)),
                )
                .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);
            frame.render_stateful_widget(list, list_area, &mut state.list_state);

            let help = if state.is_confirming_delete() {
                Paragraph::new("delete this recording? y to confirm, any key to cancel")
                    .style(Style::default().fg(FG).bg(WARNING_BG))
            } else {
                Paragraph::new("↑↓ select, ↵ play, d delete, esc/q exit")
                    .style(Style::default().fg(HELP_FG))
            };
            frame.render_widget(help.alignment(Alignment::Center), footer_area);

            if let Some((message, _)) = notification {
                render_notification(frame, area, &message);
            }
        })?;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecordingBrowser {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn render_notification(frame: &mut Frame, screen_area: Rect, message: &str) {
    let width = (message.chars().count() as u16).saturating_add(4);
    let height = 3;
    let modal_area = Rect {
        x: screen_area.x + screen_area.width.saturating_sub(width) / 2,
        y: screen_area.y + screen_area.height.saturating_sub(height) / 2,
        width: width.min(screen_area.width),
        height: height.min(screen_area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Green).fg(Color::Black));
    frame.render_widget(&block, modal_area);
    let text = Paragraph::new(message)
        .style(Style::default().bg(Color::Green).fg(Color::Black))
        .alignment(Alignment::Center);
    frame.render_widget(text, block.inner(modal_area));
}
