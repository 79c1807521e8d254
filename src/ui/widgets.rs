//! Custom widgets for the flashcard pile.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::theme::{icons, Theme};
use crate::config::Accessibility;
use crate::models::Deck;

/// Cards deeper than this are not drawn at all.
pub const MAX_VISIBLE_LAYERS: usize = 5;

/// Rows the card at `position` sits below the top card of a pile of `total`.
pub fn stack_offset(position: usize, total: usize) -> u16 {
    total
        .saturating_sub(position + 1)
        .min(MAX_VISIBLE_LAYERS - 1) as u16
}

/// Areas of the visible cards in draw order, bottom-most first.
pub fn card_rects(area: Rect, total: usize) -> Vec<(usize, Rect)> {
    let visible = total.min(MAX_VISIBLE_LAYERS);
    let depth = visible.saturating_sub(1) as u16;
    let height = area.height.saturating_sub(depth);

    (total - visible..total)
        .map(|index| {
            let offset = stack_offset(index, total);
            let inset = offset.min(area.width / 4);
            let rect = Rect {
                x: area.x + inset,
                y: area.y + offset,
                width: area.width.saturating_sub(inset * 2),
                height,
            };
            (index, rect)
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════
// Timer Badge Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct TimerBadge<'a> {
    remaining: u32,
    paused: bool,
    theme: &'a Theme,
}

impl<'a> TimerBadge<'a> {
    pub fn new(remaining: u32, paused: bool, theme: &'a Theme) -> Self {
        Self { remaining, paused, theme }
    }
}

impl Widget for TimerBadge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(24);
        let badge_area = Rect {
            x: area.x + (area.width - width) / 2,
            width,
            ..area
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.text_dim));
        let inner = block.inner(badge_area);
        block.render(badge_area, buf);

        let mut spans = vec![
            Span::styled(format!("{} ", icons::CLOCK), self.theme.key_hint()),
            Span::styled(format!("Time: {}", self.remaining), self.theme.timer(self.remaining)),
        ];
        if self.paused {
            spans.push(Span::styled(" (paused)", self.theme.key_hint()));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Card Stack Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct CardStack<'a> {
    deck: &'a Deck,
    showing_answer: bool,
    drag_offset: i32,
    inert: bool,
    accessibility: Accessibility,
    theme: &'a Theme,
}

impl<'a> CardStack<'a> {
    pub fn new(deck: &'a Deck, accessibility: Accessibility, theme: &'a Theme) -> Self {
        Self {
            deck,
            showing_answer: false,
            drag_offset: 0,
            inert: false,
            accessibility,
            theme,
        }
    }

    pub fn showing_answer(mut self, showing: bool) -> Self {
        self.showing_answer = showing;
        self
    }

    pub fn drag_offset(mut self, offset: i32) -> Self {
        self.drag_offset = offset;
        self
    }

    /// Draw the pile without any live card.
    pub fn inert(mut self, inert: bool) -> Self {
        self.inert = inert;
        self
    }

    fn render_buried(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.text_dim))
            .style(Style::default().bg(self.theme.colors.bg_card))
            .render(area, buf);
    }

    fn render_top(&self, area: Rect, buf: &mut Buffer) {
        let Some(card) = self.deck.top() else {
            return;
        };

        let swiping_right = self.drag_offset > 0;
        let swiping_left = self.drag_offset < 0;
        let colors = &self.theme.colors;

        let border_color = if self.inert {
            colors.text_dim
        } else if self.accessibility.differentiate_without_color {
            colors.accent
        } else if swiping_right {
            colors.correct
        } else if swiping_left {
            colors.wrong
        } else {
            colors.accent
        };

        // Without color cues the swipe direction is spelled out.
        let label = match (
            self.accessibility.differentiate_without_color,
            swiping_right,
            swiping_left,
        ) {
            (true, true, _) => format!("{} CORRECT", icons::CHECK),
            (true, _, true) => format!("{} WRONG", icons::CROSS),
            _ => "CARD".to_string(),
        };

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(colors.bg_card))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(label, Style::default().fg(border_color).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let text_width = inner.width.saturating_sub(4).max(1) as usize;
        let mut lines = vec![Line::from(Span::styled(
            card.prompt.as_str(),
            self.theme.card_prompt(),
        ))];
        let mut content_height = textwrap::wrap(&card.prompt, text_width).len();
        if self.showing_answer {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(card.answer.as_str(), self.theme.card_answer())));
            content_height += 1 + textwrap::wrap(&card.answer, text_width).len();
        }

        // Center vertically
        let vertical_padding = inner.height.saturating_sub(content_height as u16) / 2;
        let content_area = Rect {
            x: inner.x + 2,
            y: inner.y + vertical_padding,
            width: inner.width.saturating_sub(4),
            height: inner.height.saturating_sub(vertical_padding),
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(content_area, buf);
    }
}

impl Widget for CardStack<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bounds = area.intersection(buf.area);
        let top_index = self.deck.top_index();

        for (index, rect) in card_rects(bounds, self.deck.len()) {
            if Some(index) == top_index {
                // Dragging slides the top card sideways, staying on screen.
                let max_x = (bounds.x + bounds.width).saturating_sub(rect.width) as i32;
                let x = (rect.x as i32 + self.drag_offset)
                    .clamp(bounds.x as i32, max_x.max(bounds.x as i32));
                self.render_top(Rect { x: x as u16, ..rect }, buf);
            } else {
                self.render_buried(rect, buf);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Answer Buttons Widget
// ══════════════════════════════════════════════════════════════════════════

/// Explicit wrong/correct buttons for players who can't rely on swipe colors.
pub struct AnswerButtons<'a> {
    enabled: bool,
    theme: &'a Theme,
}

impl<'a> AnswerButtons<'a> {
    pub fn new(enabled: bool, theme: &'a Theme) -> Self {
        Self { enabled, theme }
    }

    /// `[wrong, correct]` button areas.
    pub fn areas(area: Rect) -> [Rect; 2] {
        let chunks = Layout::horizontal([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(area);
        [chunks[0], chunks[2]]
    }
}

impl Widget for AnswerButtons<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let buttons = [
            (icons::CROSS, "Wrong", "x", self.theme.colors.wrong),
            (icons::CHECK, "Correct", "c", self.theme.colors.correct),
        ];

        for ((icon, name, key, color), button_area) in buttons.into_iter().zip(Self::areas(area)) {
            let color = if self.enabled { color } else { self.theme.colors.text_dim };

            let button = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color));
            let inner = button.inner(button_area);
            button.render(button_area, buf);

            let line = Line::from(vec![
                Span::styled(
                    format!("{} {}", icon, name),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" [{}]", key), self.theme.key_hint()),
            ]);
            Paragraph::new(line)
                .alignment(Alignment::Center)
                .render(inner, buf);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Start Again Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct StartAgainButton<'a> {
    theme: &'a Theme,
}

impl<'a> StartAgainButton<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    pub fn area(area: Rect) -> Rect {
        let width = area.width.min(22);
        Rect {
            x: area.x + (area.width - width) / 2,
            width,
            height: area.height.min(3),
            ..area
        }
    }
}

impl Widget for StartAgainButton<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let button_area = Self::area(area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.correct))
            .style(Style::default().bg(self.theme.colors.text));
        let inner = block.inner(button_area);
        block.render(button_area, buf);

        Paragraph::new(Span::styled(
            "Start Again",
            Style::default()
                .fg(self.theme.colors.bg_dark)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(inner, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Key Hints Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct KeyHints<'a> {
    hints: &'a [(&'a str, &'a str)],
    theme: &'a Theme,
}

impl<'a> KeyHints<'a> {
    pub fn new(hints: &'a [(&'a str, &'a str)], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }
}

impl Widget for KeyHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(*key, self.theme.key_highlight()),
                    Span::styled(format!(" {} ", desc), self.theme.key_hint()),
                    Span::styled("│ ", Style::default().fg(self.theme.colors.text_dim)),
                ]
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
