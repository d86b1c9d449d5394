//! "Chat" screen: message input and scrolling transcript.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use clariq_core::Category;
use clariq_shared::{Intent, Reply};

use super::Action;
use crate::widgets::intent_style;

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Speaker {
    User,
    Bot,
}

/// One transcript line.
#[derive(Debug, Clone)]
pub(crate) struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub intent: Option<Intent>,
}

pub(crate) struct ChatScreen {
    input: String,
    editing: bool,
    transcript: Vec<Turn>,
    status: String,
}

impl ChatScreen {
    pub(crate) fn new() -> Self {
        Self {
            input: String::new(),
            editing: true,
            transcript: Vec::new(),
            status: "Type a message and press Enter. Esc stops editing.".to_string(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    /// Append a routed turn. A reset request clears the transcript first,
    /// leaving only the acknowledgement.
    pub(crate) fn push_turn(&mut self, message: &str, reply: &Reply) {
        if reply.intent == Intent::GeneralChat
            && Category::classify(message) == Category::ClearHistory
        {
            self.transcript.clear();
        } else {
            self.transcript.push(Turn {
                speaker: Speaker::User,
                text: message.to_string(),
                intent: None,
            });
        }
        self.transcript.push(Turn {
            speaker: Speaker::Bot,
            text: reply.text.clone(),
            intent: Some(reply.intent),
        });
        self.status = format!("Answered via {}.", reply.intent);
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(1),    // Transcript
                Constraint::Length(3), // Input
                Constraint::Length(1), // Status
            ])
            .split(area);

        let lines: Vec<Line> = self
            .transcript
            .iter()
            .flat_map(|turn| {
                let header = match turn.speaker {
                    Speaker::User => Line::from(Span::styled(
                        "You",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
                    Speaker::Bot => {
                        let mut spans = vec![Span::styled(
                            "ClariQ",
                            Style::default()
                                .fg(Color::Green)
                                .add_modifier(Modifier::BOLD),
                        )];
                        if let Some(intent) = turn.intent {
                            spans.push(Span::raw(" "));
                            spans.push(Span::styled(format!("[{intent}]"), intent_style(intent)));
                        }
                        Line::from(spans)
                    }
                };
                [header, Line::from(turn.text.as_str()), Line::from("")]
            })
            .collect();

        // Keep the newest lines in view.
        let visible = chunks[0].height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(visible) as u16;

        let transcript = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(" Conversation "));
        f.render_widget(transcript, chunks[0]);

        let input_style = if self.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let input = Paragraph::new(self.input.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Message ")
                .border_style(input_style),
        );
        f.render_widget(input, chunks[1]);

        let status = Paragraph::new(self.status.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[2]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        if code == KeyCode::Char('l') && modifiers.contains(KeyModifiers::CONTROL) {
            self.transcript.clear();
            self.status = "Transcript cleared.".to_string();
            return None;
        }

        if !self.editing {
            if code == KeyCode::Enter {
                self.editing = true;
            }
            return None;
        }

        match code {
            KeyCode::Esc => self.editing = false,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let message = self.input.trim().to_string();
                if message.is_empty() {
                    return None;
                }
                self.input.clear();
                self.status = "Thinking...".to_string();
                return Some(Action::Send(message));
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        None
    }
}
