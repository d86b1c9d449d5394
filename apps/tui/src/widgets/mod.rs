//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use clariq_shared::Intent;

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Colour used for an intent label.
pub(crate) fn intent_style(intent: Intent) -> Style {
    let color = match intent {
        Intent::WebQuery => Color::Blue,
        Intent::IdentityQuery => Color::Magenta,
        Intent::KnowledgeQuery => Color::Yellow,
        Intent::GeneralChat => Color::Gray,
        Intent::Error => Color::Red,
    };
    Style::default().fg(color)
}
