//! "Knowledge" screen: browse stored question/answer pairs.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use clariq_shared::KnowledgeEntry;

use super::Action;

pub(crate) struct KnowledgeScreen {
    entries: Vec<KnowledgeEntry>,
    selected: usize,
    status: String,
}

impl KnowledgeScreen {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            selected: 0,
            status: "Press 'r' to refresh, 's' to load the starter set.".to_string(),
        }
    }

    pub(crate) fn set_entries(&mut self, entries: Vec<KnowledgeEntry>) {
        self.status = format!("{} knowledge entries.", entries.len());
        self.entries = entries;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(1),    // List
                Constraint::Length(5), // Answer
                Constraint::Length(1), // Status
            ])
            .split(area);

        if self.entries.is_empty() {
            let empty = Paragraph::new(
                "No knowledge entries.\n\nPress 's' to load the starter set, \
                 or add entries with `clariq knowledge add`.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Knowledge "));
            f.render_widget(empty, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let style = if i == self.selected {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    let prefix = if i == self.selected { "▸ " } else { "  " };
                    ListItem::new(format!("{prefix}#{}  {}", entry.id, entry.question)).style(style)
                })
                .collect();

            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Knowledge ({}) ", self.entries.len())),
            );
            f.render_widget(list, chunks[0]);
        }

        let answer = self
            .entries
            .get(self.selected)
            .map(|entry| entry.answer.as_str())
            .unwrap_or("");
        let answer = Paragraph::new(answer)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Answer "));
        f.render_widget(answer, chunks[1]);

        let status = Paragraph::new(self.status.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[2]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Option<Action> {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char('r') => Some(Action::RefreshKnowledge),
            KeyCode::Char('s') => Some(Action::SeedKnowledge),
            _ => None,
        }
    }
}
