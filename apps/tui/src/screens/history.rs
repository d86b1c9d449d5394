//! "History" screen: recent conversation log rows, newest first.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use clariq_shared::ConversationLogEntry;

use super::Action;
use crate::widgets::intent_style;

/// Rows fetched per refresh.
pub(crate) const HISTORY_LIMIT: u32 = 100;

pub(crate) struct HistoryScreen {
    logs: Vec<ConversationLogEntry>,
    offset: usize,
    status: String,
}

impl HistoryScreen {
    pub(crate) fn new() -> Self {
        Self {
            logs: Vec::new(),
            offset: 0,
            status: "Press 'r' to refresh.".to_string(),
        }
    }

    pub(crate) fn set_logs(&mut self, logs: Vec<ConversationLogEntry>) {
        self.status = format!("{} recent turns.", logs.len());
        self.logs = logs;
        self.offset = 0;
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(1),    // Table
                Constraint::Length(1), // Status
            ])
            .split(area);

        let rows: Vec<Row> = self
            .logs
            .iter()
            .skip(self.offset)
            .map(|entry| {
                Row::new(vec![
                    Cell::from(entry.timestamp.format("%m-%d %H:%M:%S").to_string()),
                    Cell::from(entry.intent.as_str()).style(intent_style(entry.intent)),
                    Cell::from(entry.user_input.as_str()),
                    Cell::from(entry.bot_response.as_str()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(14),
                Constraint::Length(15),
                Constraint::Percentage(35),
                Constraint::Percentage(65),
            ],
        )
        .header(
            Row::new(vec!["Time", "Intent", "Message", "Response"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" History "));
        f.render_widget(table, chunks[0]);

        let status = Paragraph::new(self.status.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Option<Action> {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.offset = self.offset.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.offset + 1 < self.logs.len() {
                    self.offset += 1;
                }
                None
            }
            KeyCode::Char('r') => Some(Action::RefreshHistory),
            _ => None,
        }
    }
}
