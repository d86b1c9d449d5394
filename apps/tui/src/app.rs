//! Core TUI application state and event loop.

use std::io;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tracing::{info, warn};

use clariq_core::ChatRouter;

use crate::screens::chat::ChatScreen;
use crate::screens::history::{HISTORY_LIMIT, HistoryScreen};
use crate::screens::knowledge::KnowledgeScreen;
use crate::screens::{Action, ScreenId};
use crate::widgets::status_bar;

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    pub chat: ChatScreen,
    pub knowledge: KnowledgeScreen,
    pub history: HistoryScreen,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            active_tab: 0,
            should_quit: false,
            status: "Ready, press Esc then ? for help".to_string(),
            show_help: false,
            chat: ChatScreen::new(),
            knowledge: KnowledgeScreen::new(),
            history: HistoryScreen::new(),
        }
    }

    fn current_screen(&self) -> ScreenId {
        ScreenId::ALL[self.active_tab]
    }

    fn is_editing(&self) -> bool {
        self.current_screen() == ScreenId::Chat && self.chat.is_editing()
    }

    /// Switch tabs; entering a data tab reloads it.
    fn select_tab(&mut self, idx: usize) -> Option<Action> {
        self.active_tab = idx;
        let screen = self.current_screen();
        self.status = screen.to_string();
        match screen {
            ScreenId::Chat => None,
            ScreenId::Knowledge => Some(Action::RefreshKnowledge),
            ScreenId::History => Some(Action::RefreshHistory),
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        let tabs = ScreenId::ALL.len();

        // Global keybindings (always active)
        match code {
            KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('q') if !self.is_editing() => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('?') if !self.is_editing() => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return None;
            }
            KeyCode::Char(c @ '1'..='3') if !self.is_editing() => {
                let idx = (c as usize) - ('1' as usize);
                return self.select_tab(idx);
            }
            KeyCode::Tab if !self.is_editing() => {
                return self.select_tab((self.active_tab + 1) % tabs);
            }
            KeyCode::BackTab if !self.is_editing() => {
                return self.select_tab((self.active_tab + tabs - 1) % tabs);
            }
            _ => {}
        }

        // If help is showing, consume any key to dismiss
        if self.show_help {
            self.show_help = false;
            return None;
        }

        match self.current_screen() {
            ScreenId::Chat => self.chat.handle_key(code, modifiers),
            ScreenId::Knowledge => self.knowledge.handle_key(code, modifiers),
            ScreenId::History => self.history.handle_key(code, modifiers),
        }
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) async fn run(router: ChatRouter) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &router).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    router: &ChatRouter,
) -> Result<()> {
    let mut app = App::new();

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = app.handle_key(key.code, key.modifiers) {
                    // Show "Thinking..." before blocking on the router.
                    terminal.draw(|f| draw(f, &app))?;
                    perform(&mut app, router, action).await;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI closed");
    Ok(())
}

/// Run a screen's requested work and feed the result back into the UI.
async fn perform(app: &mut App, router: &ChatRouter, action: Action) {
    match action {
        Action::Send(message) => {
            let reply = router.reply(&message).await;
            app.chat.push_turn(&message, &reply);
        }
        Action::RefreshKnowledge => match router.knowledge().list_knowledge().await {
            Ok(entries) => app.knowledge.set_entries(entries),
            Err(e) => {
                warn!(error = %e, "failed to list knowledge");
                app.knowledge.set_status(format!("Failed to load: {e}"));
            }
        },
        Action::SeedKnowledge => match router.knowledge().seed_default_knowledge().await {
            Ok(inserted) => {
                if let Ok(entries) = router.knowledge().list_knowledge().await {
                    app.knowledge.set_entries(entries);
                }
                let msg = if inserted == 0 {
                    "Knowledge already present; nothing seeded.".to_string()
                } else {
                    format!("Seeded {inserted} entries.")
                };
                app.knowledge.set_status(msg);
            }
            Err(e) => {
                warn!(error = %e, "failed to seed knowledge");
                app.knowledge.set_status(format!("Seeding failed: {e}"));
            }
        },
        Action::RefreshHistory => {
            match router.knowledge().recent_conversation_logs(HISTORY_LIMIT).await {
                Ok(logs) => app.history.set_logs(logs),
                Err(e) => {
                    warn!(error = %e, "failed to load history");
                    app.history.set_status(format!("Failed to load: {e}"));
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar
    let tab_titles: Vec<Line> = ScreenId::ALL
        .iter()
        .map(|s| Line::from(s.to_string()))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" ClariQ "))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    match app.current_screen() {
        ScreenId::Chat => app.chat.draw(f, chunks[1]),
        ScreenId::Knowledge => app.knowledge.draw(f, chunks[1]),
        ScreenId::History => app.history.draw(f, chunks[1]),
    }

    let bar = status_bar(&app.status);
    f.render_widget(bar, chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-3          Switch to screen"),
        Line::from("  Tab/S-Tab    Next/previous screen"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Chat:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Enter        Send message / start typing"),
        Line::from("  Esc          Stop typing"),
        Line::from("  Ctrl-L       Clear transcript"),
        Line::from(""),
        Line::from("Knowledge / History:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Navigate"),
        Line::from("  r            Refresh"),
        Line::from("  s            Load starter knowledge"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (press any key to close) ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, code: KeyCode) -> Option<Action> {
        app.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_q_in_chat_does_not_quit() {
        let mut app = App::new();
        assert!(app.is_editing());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
    }

    #[test]
    fn q_quits_once_editing_stops() {
        let mut app = App::new();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut app = App::new();
        app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn switching_to_data_tabs_requests_refresh() {
        let mut app = App::new();
        press(&mut app, KeyCode::Esc);
        assert_eq!(press(&mut app, KeyCode::Char('2')), Some(Action::RefreshKnowledge));
        assert_eq!(app.current_screen(), ScreenId::Knowledge);
        assert_eq!(press(&mut app, KeyCode::Tab), Some(Action::RefreshHistory));
        assert_eq!(press(&mut app, KeyCode::Tab), None);
        assert_eq!(app.current_screen(), ScreenId::Chat);
        assert_eq!(press(&mut app, KeyCode::BackTab), Some(Action::RefreshHistory));
    }

    #[test]
    fn help_overlay_swallows_next_key() {
        let mut app = App::new();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        assert_eq!(press(&mut app, KeyCode::Char('r')), None);
        assert!(!app.show_help);
    }
}
