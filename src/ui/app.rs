//! Main application state and logic.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use super::theme::{icons, Theme};
use super::widgets::{card_rects, AnswerButtons, CardStack, KeyHints, StartAgainButton, TimerBadge};
use crate::config::Config;
use crate::models::{Card, Deck};
use crate::session::{SessionController, SessionEvent, SessionState};
use crate::storage::{CardStore, KeyValueStore};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Columns a card has to travel before a drag counts as a swipe.
const SWIPE_THRESHOLD: i32 = 12;

// ══════════════════════════════════════════════════════════════════════════
// Application State
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Study,
    EditCards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditFocus {
    Prompt,
    Answer,
    List,
}

impl EditFocus {
    fn next(self) -> Self {
        match self {
            EditFocus::Prompt => EditFocus::Answer,
            EditFocus::Answer => EditFocus::List,
            EditFocus::List => EditFocus::Prompt,
        }
    }

    fn prev(self) -> Self {
        match self {
            EditFocus::Prompt => EditFocus::List,
            EditFocus::Answer => EditFocus::Prompt,
            EditFocus::List => EditFocus::Answer,
        }
    }
}

/// Fixed-period clock. It never stops; the session decides whether a tick matters.
pub struct Ticker {
    period: Duration,
    last: Instant,
}

impl Ticker {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, last: now }
    }

    /// True when at least one period has passed. Missed periods are
    /// dropped: after a stall the clock re-anchors at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < self.period {
            return false;
        }
        if elapsed >= self.period * 2 {
            debug!(?elapsed, "clock stalled, dropping missed ticks");
            self.last = now;
        } else {
            self.last += self.period;
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_column: u16,
    offset: i32,
}

pub struct App<S> {
    pub screen: Screen,
    pub running: bool,

    // Config and theme. `config` includes command-line overrides and is
    // never saved as a whole.
    pub config: Config,
    config_path: PathBuf,
    pub theme: Theme,

    // Storage and session
    pub store: CardStore<S>,
    pub session: SessionController,
    ticker: Ticker,
    needs_redraw: bool,

    // Study state
    pub showing_answer: bool,
    drag: Option<Drag>,
    top_card_area: Option<Rect>,
    answer_button_areas: Option<[Rect; 2]>,
    start_again_area: Option<Rect>,

    // Edit state
    pub edit_cards: Deck,
    pub edit_prompt: String,
    pub edit_answer: String,
    pub edit_focus: EditFocus,
    pub edit_list_state: ListState,

    // Status message (shown temporarily)
    pub status_message: Option<(String, Instant)>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: CardStore<S>, config: Config, config_path: PathBuf) -> Self {
        let theme = Theme::from_name(&config.theme);
        let session = SessionController::start(config.session_seconds, &store);

        Self {
            screen: Screen::Study,
            running: true,
            config,
            config_path,
            theme,
            store,
            session,
            ticker: Ticker::new(TICK_PERIOD, Instant::now()),
            needs_redraw: true,
            showing_answer: false,
            drag: None,
            top_card_area: None,
            answer_button_areas: None,
            start_again_area: None,
            edit_cards: Deck::new(),
            edit_prompt: String::new(),
            edit_answer: String::new(),
            edit_focus: EditFocus::Prompt,
            edit_list_state: ListState::default(),
            status_message: None,
        }
    }

    /// Feed one event to the session and schedule a redraw if it changed anything.
    pub fn dispatch(&mut self, event: SessionEvent) {
        let Some(snapshot) = self.session.handle(event, &self.store) else {
            return;
        };
        self.needs_redraw = true;

        if matches!(
            event,
            SessionEvent::RemoveTop | SessionEvent::RemoveAt(_) | SessionEvent::Reset
        ) {
            self.showing_answer = false;
            self.drag = None;
        }
        if snapshot.state == SessionState::Expired {
            self.drag = None;
        }
    }

    /// Returns true once per change that needs a redraw.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
        self.needs_redraw = true;
    }

    pub fn cycle_theme(&mut self) {
        let new_theme_name = self.theme.name.next();
        self.theme = Theme::new(new_theme_name);
        self.config.theme = new_theme_name.as_str().to_string();
        self.save_theme();
    }

    /// Write only the theme back to the config file, leaving every other
    /// setting as the file has it.
    fn save_theme(&self) {
        let mut saved = match Config::load(&self.config_path) {
            Ok(saved) => saved,
            Err(err) => {
                warn!(error = %err, "config file unreadable, theme not saved");
                return;
            }
        };
        saved.theme = self.theme.name.as_str().to_string();
        if let Err(err) = saved.save(&self.config_path) {
            warn!(error = %err, "failed to save config");
        }
    }

    pub fn toggle_answer(&mut self) {
        if self.session.accepts_input() {
            self.showing_answer = !self.showing_answer;
        }
    }

    /// Right and wrong both just take the card off the pile.
    pub fn judge_top_card(&mut self, correct: bool) {
        debug!(correct, "top card judged");
        self.dispatch(SessionEvent::RemoveTop);
    }

    pub fn start_again(&mut self) {
        if self.session.state() == SessionState::Completed {
            self.dispatch(SessionEvent::Reset);
        }
    }

    pub fn open_editor(&mut self) {
        self.edit_cards = self.store.saved_cards();
        self.edit_prompt.clear();
        self.edit_answer.clear();
        self.edit_focus = EditFocus::Prompt;
        self.edit_list_state = if self.edit_cards.is_empty() {
            ListState::default()
        } else {
            ListState::default().with_selected(Some(0))
        };
        self.drag = None;
        self.screen = Screen::EditCards;
    }

    /// Leaving the editor restarts the session so edits apply right away.
    pub fn close_editor(&mut self) {
        self.screen = Screen::Study;
        self.dispatch(SessionEvent::Reset);
    }

    pub fn add_card(&mut self) {
        let prompt = self.edit_prompt.trim();
        let answer = self.edit_answer.trim();
        if prompt.is_empty() || answer.is_empty() {
            return;
        }

        match self.store.add_card(Card::new(prompt, answer)) {
            Ok(deck) => {
                self.edit_cards = deck;
                self.edit_list_state.select(Some(0));
                self.edit_prompt.clear();
                self.edit_answer.clear();
                self.edit_focus = EditFocus::Prompt;
            }
            Err(err) => {
                warn!(error = %err, "failed to save new card");
                self.set_status(format!("Save failed: {}", err));
            }
        }
    }

    pub fn delete_selected_card(&mut self) {
        let Some(i) = self.edit_list_state.selected() else {
            return;
        };

        match self.store.delete_card(i) {
            Ok((_, deck)) => {
                self.edit_cards = deck;
                // Adjust selection
                if self.edit_cards.is_empty() {
                    self.edit_list_state.select(None);
                } else if i >= self.edit_cards.len() {
                    self.edit_list_state.select(Some(self.edit_cards.len() - 1));
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to save after delete");
                self.set_status(format!("Save failed: {}", err));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Event Handling
    // ══════════════════════════════════════════════════════════════════════

    pub fn handle_events(&mut self) -> anyhow::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            self.handle_event(event);
        }
        self.on_clock(Instant::now());
        Ok(())
    }

    pub fn on_clock(&mut self, now: Instant) {
        if self.ticker.poll(now) {
            self.dispatch(SessionEvent::Tick);
        }

        if let Some((_, shown_at)) = self.status_message {
            if now.saturating_duration_since(shown_at) >= STATUS_TIMEOUT {
                self.status_message = None;
                self.needs_redraw = true;
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                match self.screen {
                    Screen::Study => self.handle_study_keys(key.code),
                    Screen::EditCards => self.handle_edit_keys(key.code),
                }
                self.needs_redraw = true;
            }
            Event::Mouse(mouse) => {
                if self.screen == Screen::Study {
                    self.handle_study_mouse(mouse);
                    self.needs_redraw = true;
                }
            }
            Event::FocusGained => self.dispatch(SessionEvent::Foreground),
            Event::FocusLost => self.dispatch(SessionEvent::Background),
            Event::Resize(_, _) => self.needs_redraw = true,
            _ => {}
        }
    }

    fn handle_study_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('e') | KeyCode::Char('+') => self.open_editor(),
            KeyCode::Char(' ') => self.toggle_answer(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('c') => self.judge_top_card(true),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('x') => self.judge_top_card(false),
            KeyCode::Enter | KeyCode::Char('r') => self.start_again(),
            _ => {}
        }
    }

    fn handle_study_mouse(&mut self, mouse: MouseEvent) {
        let (col, row) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(area) = self.start_again_area {
                    if contains(area, col, row) {
                        self.start_again();
                        return;
                    }
                }

                if let Some([wrong, correct]) = self.answer_button_areas {
                    if contains(wrong, col, row) {
                        self.judge_top_card(false);
                        return;
                    }
                    if contains(correct, col, row) {
                        self.judge_top_card(true);
                        return;
                    }
                }

                // Only the top card is hit-testable.
                if let Some(area) = self.top_card_area {
                    if contains(area, col, row) && self.session.accepts_input() {
                        self.drag = Some(Drag {
                            start_column: col,
                            offset: 0,
                        });
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(ref mut drag) = self.drag {
                    drag.offset = col as i32 - drag.start_column as i32;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(drag) = self.drag.take() else {
                    return;
                };
                if drag.offset.abs() >= SWIPE_THRESHOLD {
                    debug!(correct = drag.offset > 0, "top card swiped");
                    if let Some(index) = self.session.deck().top_index() {
                        self.dispatch(SessionEvent::RemoveAt(index));
                    }
                } else if drag.offset == 0 {
                    self.toggle_answer();
                }
            }
            _ => {}
        }
    }

    fn handle_edit_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.close_editor(),
            KeyCode::Tab => self.edit_focus = self.edit_focus.next(),
            KeyCode::BackTab => self.edit_focus = self.edit_focus.prev(),
            KeyCode::Enter => match self.edit_focus {
                EditFocus::Prompt => self.edit_focus = EditFocus::Answer,
                EditFocus::Answer => self.add_card(),
                EditFocus::List => {}
            },
            KeyCode::Up | KeyCode::Down if self.edit_focus == EditFocus::List => {
                self.move_edit_selection(key == KeyCode::Down);
            }
            KeyCode::Delete if self.edit_focus == EditFocus::List => self.delete_selected_card(),
            KeyCode::Char(c) => match self.edit_focus {
                EditFocus::Prompt => self.edit_prompt.push(c),
                EditFocus::Answer => self.edit_answer.push(c),
                EditFocus::List => match c {
                    'd' => self.delete_selected_card(),
                    'j' => self.move_edit_selection(true),
                    'k' => self.move_edit_selection(false),
                    _ => {}
                },
            },
            KeyCode::Backspace => match self.edit_focus {
                EditFocus::Prompt => {
                    self.edit_prompt.pop();
                }
                EditFocus::Answer => {
                    self.edit_answer.pop();
                }
                EditFocus::List => {}
            },
            _ => {}
        }
    }

    fn move_edit_selection(&mut self, down: bool) {
        let len = self.edit_cards.len();
        if len == 0 {
            return;
        }
        let i = self.edit_list_state.selected().unwrap_or(0);
        let new_i = if down {
            if i >= len - 1 { 0 } else { i + 1 }
        } else if i == 0 {
            len - 1
        } else {
            i - 1
        };
        self.edit_list_state.select(Some(new_i));
    }

    // ══════════════════════════════════════════════════════════════════════
    // Rendering
    // ══════════════════════════════════════════════════════════════════════

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with background
        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.colors.bg_dark)),
            area,
        );

        match self.screen {
            Screen::Study => self.render_study(frame, area),
            Screen::EditCards => self.render_edit_cards(frame, area),
        }

        self.render_status(frame, area);
    }

    fn render_study(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),   // Timer
            Constraint::Length(1),   // Spacing
            Constraint::Min(8),      // Pile
            Constraint::Length(3),   // Buttons
            Constraint::Length(2),   // Hints
        ])
        .split(area);

        let snapshot = self.session.snapshot();
        let accessibility = self.config.accessibility;

        frame.render_widget(
            TimerBadge::new(
                snapshot.remaining_time,
                snapshot.state == SessionState::Paused,
                &self.theme,
            ),
            chunks[0],
        );

        // Pile
        let pile_area = centered_rect(60, 100, chunks[2]);
        let deck = self.session.deck();
        self.top_card_area = deck
            .top_index()
            .and_then(|top| {
                card_rects(pile_area, deck.len())
                    .into_iter()
                    .find(|(index, _)| *index == top)
            })
            .map(|(_, rect)| rect);

        if snapshot.state == SessionState::Completed {
            let done = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} All cards done", icons::CHECK),
                    Style::default()
                        .fg(self.theme.colors.correct)
                        .add_modifier(Modifier::BOLD),
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(done, pile_area);
        } else {
            frame.render_widget(
                CardStack::new(deck, accessibility, &self.theme)
                    .showing_answer(self.showing_answer)
                    .drag_offset(self.drag.map_or(0, |d| d.offset))
                    .inert(!snapshot.accepts_input),
                pile_area,
            );
        }

        // Buttons
        self.start_again_area = None;
        self.answer_button_areas = None;
        if snapshot.state == SessionState::Completed {
            frame.render_widget(StartAgainButton::new(&self.theme), chunks[3]);
            self.start_again_area = Some(StartAgainButton::area(chunks[3]));
        } else if accessibility.explicit_buttons() {
            let buttons_area = centered_rect(80, 100, chunks[3]);
            frame.render_widget(
                AnswerButtons::new(snapshot.accepts_input, &self.theme),
                buttons_area,
            );
            self.answer_button_areas = Some(AnswerButtons::areas(buttons_area));
        }

        // Key hints
        let theme_hint = format!("[{}]", self.theme.name.display_name());
        let hints_data: Vec<(&str, &str)> = match snapshot.state {
            SessionState::Completed => vec![
                ("Enter", "start again"),
                ("e", "edit cards"),
                ("t", theme_hint.as_str()),
                ("q", "quit"),
            ],
            SessionState::Expired => vec![
                ("e", "edit cards"),
                ("t", theme_hint.as_str()),
                ("q", "quit"),
            ],
            _ => vec![
                ("Space", "answer"),
                ("←/x", "wrong"),
                ("→/c", "correct"),
                ("e", "edit cards"),
                ("t", theme_hint.as_str()),
                ("q", "quit"),
            ],
        };
        frame.render_widget(KeyHints::new(&hints_data, &self.theme), chunks[4]);
    }

    fn render_edit_cards(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),   // Title
            Constraint::Length(3),   // Prompt input
            Constraint::Length(3),   // Answer input
            Constraint::Length(1),   // Spacing
            Constraint::Min(5),      // Card list
            Constraint::Length(2),   // Hints
        ])
        .split(centered_rect(70, 100, area));

        let title = Paragraph::new(format!("{} Edit Cards", icons::PLUS))
            .alignment(Alignment::Center)
            .style(self.theme.title());
        frame.render_widget(title, chunks[0]);

        let fields = [
            (EditFocus::Prompt, " Prompt ", self.edit_prompt.as_str(), chunks[1]),
            (EditFocus::Answer, " Answer ", self.edit_answer.as_str(), chunks[2]),
        ];
        for (focus, label, text, field_area) in fields {
            let style = if self.edit_focus == focus {
                Style::default().fg(self.theme.colors.accent)
            } else {
                Style::default().fg(self.theme.colors.text_muted)
            };
            let input = Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(style)
                    .title(label)
                    .title_style(style),
            );
            frame.render_widget(input, field_area);

            if self.edit_focus == focus {
                let inner_width = field_area.width.saturating_sub(2);
                let col = (text.width() as u16).min(inner_width.saturating_sub(1));
                frame.set_cursor_position((field_area.x + 1 + col, field_area.y + 1));
            }
        }

        let items: Vec<ListItem> = self
            .edit_cards
            .iter()
            .map(|card| {
                let prompt: String = card.prompt.chars().take(30).collect();
                let answer: String = card.answer.chars().take(30).collect();
                ListItem::new(Line::from(vec![
                    Span::styled(prompt, Style::default().fg(self.theme.colors.text)),
                    Span::styled(" → ", Style::default().fg(self.theme.colors.text_dim)),
                    Span::styled(answer, Style::default().fg(self.theme.colors.text_muted)),
                ]))
            })
            .collect();

        let list_border = if self.edit_focus == EditFocus::List {
            self.theme.colors.accent
        } else {
            self.theme.colors.primary
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(list_border))
                    .title(format!(" Cards ({}) ", self.edit_cards.len()))
                    .title_style(self.theme.highlight()),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[4], &mut self.edit_list_state);

        let hints = if self.edit_focus == EditFocus::List {
            KeyHints::new(
                &[("j/k", "nav"), ("d", "delete"), ("Tab", "switch"), ("Esc", "done")],
                &self.theme,
            )
        } else {
            KeyHints::new(
                &[("Tab", "switch field"), ("Enter", "add card"), ("Esc", "done")],
                &self.theme,
            )
        };
        frame.render_widget(hints, chunks[5]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some((ref msg, _)) = self.status_message {
            let status = Paragraph::new(msg.as_str())
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.colors.wrong));
            let status_area = Rect {
                x: area.x,
                y: (area.y + area.height).saturating_sub(3),
                width: area.width,
                height: 1,
            };
            frame.render_widget(status, status_area);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Helper Functions
// ══════════════════════════════════════════════════════════════════════════

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Accessibility, Overrides};
    use crate::storage::MemoryStore;
    use std::fs;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn test_app(config: Config, deck: Option<Deck>) -> (App<MemoryStore>, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut store = CardStore::new(MemoryStore::default());
        if let Some(deck) = deck {
            store.save(&deck).unwrap();
        }
        let app = App::new(store, config, temp.path().join("config.toml"));
        (app, temp)
    }

    fn abc() -> Deck {
        Deck::from(vec![
            Card::new("Alpha", "a"),
            Card::new("Bravo", "b"),
            Card::new("Charlie", "c"),
        ])
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn mouse(app: &mut App<MemoryStore>, kind: MouseEventKind, column: u16, row: u16) {
        app.handle_event(Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }));
    }

    fn draw(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_ticker_fires_once_per_period() {
        let start = Instant::now();
        let mut ticker = Ticker::new(TICK_PERIOD, start);
        assert!(!ticker.poll(start + Duration::from_millis(900)));
        assert!(ticker.poll(start + Duration::from_millis(1100)));
        assert!(!ticker.poll(start + Duration::from_millis(1900)));
        assert!(ticker.poll(start + Duration::from_millis(2050)));
        assert_eq!(ticker.last, start + Duration::from_secs(2));
    }

    #[test]
    fn test_ticker_drops_missed_periods() {
        let start = Instant::now();
        let mut ticker = Ticker::new(TICK_PERIOD, start);
        let resumed = start + Duration::from_millis(3500);

        assert!(ticker.poll(resumed));
        assert_eq!(ticker.last, resumed);
        assert!(!ticker.poll(resumed + Duration::from_millis(900)));
        assert!(ticker.poll(resumed + Duration::from_secs(1)));
    }

    #[test]
    fn test_long_stall_costs_one_second() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        let start = app.ticker.last;

        app.on_clock(start + Duration::from_secs(3600));
        assert_eq!(app.session.remaining_time(), 99);
        assert_eq!(app.session.state(), SessionState::Active);
    }

    #[test]
    fn test_first_launch_shows_example_card() {
        let (mut app, _temp) = test_app(Config::default(), None);
        let screen = draw(&mut app);
        assert!(screen.contains("Time: 100"));
        assert!(screen.contains("What is 2 + 2?"));
        assert!(!screen.contains("Start Again"));
    }

    #[test]
    fn test_keys_work_through_the_pile_and_start_again() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));

        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.deck().top(), Some(&Card::new("Bravo", "b")));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.state(), SessionState::Completed);
        assert!(draw(&mut app).contains("Start Again"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.deck(), &abc());
        assert_eq!(app.session.state(), SessionState::Active);
    }

    #[test]
    fn test_space_reveals_answer_until_card_removed() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));

        press(&mut app, KeyCode::Char(' '));
        assert!(app.showing_answer);
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.showing_answer);
    }

    #[test]
    fn test_clock_ticks_and_focus_pauses() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        let start = app.ticker.last;

        for second in 1..=3 {
            app.on_clock(start + Duration::from_secs(second));
        }
        assert_eq!(app.session.remaining_time(), 97);

        app.handle_event(Event::FocusLost);
        for second in 4..=6 {
            app.on_clock(start + Duration::from_secs(second));
        }
        assert_eq!(app.session.remaining_time(), 97);
        assert!(draw(&mut app).contains("(paused)"));

        app.handle_event(Event::FocusGained);
        app.on_clock(start + Duration::from_secs(7));
        assert_eq!(app.session.remaining_time(), 96);
    }

    #[test]
    fn test_expired_session_ignores_answers() {
        let config = Config {
            session_seconds: 1,
            ..Config::default()
        };
        let (mut app, _temp) = test_app(config, Some(abc()));
        let start = app.ticker.last;

        app.on_clock(start + Duration::from_secs(1));
        assert_eq!(app.session.state(), SessionState::Expired);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session.deck().len(), 3);
        assert!(!app.showing_answer);
        assert!(draw(&mut app).contains("Time: 0"));
    }

    #[test]
    fn test_mouse_tap_and_swipe_on_top_card() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        draw(&mut app);
        let area = app.top_card_area.unwrap();
        let (col, row) = (area.x + area.width / 2, area.y + 1);

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), col, row);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), col, row);
        assert!(app.showing_answer);

        // A short drag snaps back.
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), col, row);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), col + 3, row);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), col + 3, row);
        assert_eq!(app.session.deck().len(), 3);

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), col, row);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), col - 15, row);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), col - 15, row);
        assert_eq!(app.session.deck().len(), 2);
        assert!(!app.showing_answer);
    }

    #[test]
    fn test_clicks_outside_top_card_do_nothing() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        draw(&mut app);

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 0, 0);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 30, 0);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), 30, 0);
        assert_eq!(app.session.deck().len(), 3);
        assert!(!app.showing_answer);
    }

    #[test]
    fn test_accessible_buttons() {
        let config = Config {
            accessibility: Accessibility {
                differentiate_without_color: false,
                voice_assistance: true,
            },
            ..Config::default()
        };
        let (mut app, _temp) = test_app(config, Some(abc()));
        let screen = draw(&mut app);
        assert!(screen.contains("Wrong"));
        assert!(screen.contains("Correct"));

        let [wrong, _] = app.answer_button_areas.unwrap();
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), wrong.x + 1, wrong.y + 1);
        assert_eq!(app.session.deck().len(), 2);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.session.deck().len(), 1);
    }

    #[test]
    fn test_editor_changes_apply_on_dismiss() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        let start = app.ticker.last;
        app.on_clock(start + Duration::from_secs(10));
        press(&mut app, KeyCode::Right);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.screen, Screen::EditCards);
        assert_eq!(app.edit_cards, abc());

        type_text(&mut app, "hola");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.edit_cards.len(), 4);
        assert!(app.edit_prompt.is_empty());
        assert!(draw(&mut app).contains("hola"));

        // Delete "Alpha", now second in the list.
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.edit_cards.len(), 3);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Study);
        assert_eq!(app.session.remaining_time(), 100);
        assert_eq!(
            app.session.deck(),
            &Deck::from(vec![
                Card::new("hola", "hello"),
                Card::new("Bravo", "b"),
                Card::new("Charlie", "c"),
            ])
        );
    }

    #[test]
    fn test_first_launch_editor_starts_empty() {
        let (mut app, _temp) = test_app(Config::default(), None);
        press(&mut app, KeyCode::Char('e'));
        assert!(app.edit_cards.is_empty());
        assert_eq!(app.edit_list_state.selected(), None);

        type_text(&mut app, "hola");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.edit_cards, Deck::from(vec![Card::new("hola", "hello")]));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.session.deck(), &Deck::from(vec![Card::new("hola", "hello")]));
    }

    #[test]
    fn test_blank_cards_are_not_added() {
        let (mut app, _temp) = test_app(Config::default(), Some(abc()));
        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.load(), abc());
    }

    #[test]
    fn test_cycle_theme_persists_config() {
        let (mut app, temp) = test_app(Config::default(), None);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.config.theme, "kanagawa-wave");

        let saved = Config::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(saved.theme, "kanagawa-wave");
    }

    #[test]
    fn test_theme_change_keeps_overrides_out_of_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        Config::default().save(&path).unwrap();

        let overrides = Overrides {
            session_seconds: Some(5),
            voice_assistance: true,
        };
        let config = overrides.apply(Config::load(&path).unwrap());
        let mut app = App::new(CardStore::new(MemoryStore::default()), config, path.clone());
        assert_eq!(app.session.remaining_time(), 5);

        press(&mut app, KeyCode::Char('t'));
        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.theme, "kanagawa-wave");
        assert_eq!(saved.session_seconds, 100);
        assert!(!saved.accessibility.voice_assistance);
        assert!(app.config.accessibility.voice_assistance);
    }

    #[test]
    fn test_unreadable_config_file_is_left_alone() {
        let (mut app, temp) = test_app(Config::default(), None);
        let path = temp.path().join("config.toml");
        fs::write(&path, "session_seconds = \"soon\"").unwrap();

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.config.theme, "kanagawa-wave");
        assert_eq!(fs::read_to_string(&path).unwrap(), "session_seconds = \"soon\"");
    }

    #[test]
    fn test_quit() {
        let (mut app, _temp) = test_app(Config::default(), None);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }
}
