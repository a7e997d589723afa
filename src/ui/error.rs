//! Full-screen error display.
//!
//! Used when a command fails after the terminal UI has been set up, so the message is
//! not lost when the alternate screen is left.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(175, 52, 68);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Centers a block of `height` rows using 80% of the width.
fn message_area(area: Rect, height: u16) -> Rect {
    let width = area.width * 4 / 5;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn message_lines(message: &str) -> Vec<Line<'_>> {
    let mut lines: Vec<Line> = message
        .lines()
        .map(|line| Line::from(Span::raw(line)))
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "press any key",
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines
}

/// Red full-screen panel showing a message until a key is pressed.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters the alternate screen.
    ///
    /// # Errors
    /// - If raw mode or the alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen { terminal })
    }

    /// Shows `message` and blocks until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame
                    .buffer_mut()
                    .set_style(area, Style::default().bg(ERROR_BG));

                let lines = message_lines(message);
                let text_area = message_area(area, lines.len() as u16 + 2);
                let paragraph = Paragraph::new(lines)
                    .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, text_area);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Leaves the alternate screen.
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows `message` on an [`ErrorScreen`] and restores the terminal afterwards.
///
/// # Errors
/// - If the terminal cannot be set up or drawn to
pub fn show_error(message: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show_error(message)?;
    screen.cleanup()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_centered() {
        let area = message_area(Rect::new(0, 0, 100, 40), 6);
        assert_eq!(area, Rect::new(10, 17, 80, 6));
    }

    #[test]
    fn test_message_area_fits_small_terminals() {
        let area = message_area(Rect::new(0, 0, 10, 3), 6);
        assert_eq!(area.height, 3);
        assert_eq!(area.y, 0);
    }

    #[test]
    fn test_message_gets_dismiss_hint() {
        let lines = message_lines("Recording Error:\n\nno device");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2].spans[0].content, "no device");
    }
}
