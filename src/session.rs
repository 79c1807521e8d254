//! Study session state machine: countdown, pause/resume and deck depletion.
//!
//! The controller knows nothing about rendering. The host feeds it
//! [`SessionEvent`]s and redraws whenever [`SessionController::handle`]
//! reports a new [`SessionSnapshot`].

use tracing::{debug, info};

use crate::models::{Card, Deck};
use crate::storage::{CardStore, KeyValueStore};

/// Session length used when nothing else is configured.
pub const DEFAULT_SESSION_SECONDS: u32 = 100;

/// Where a reset reloads its deck from.
pub trait DeckSource {
    fn load(&self) -> Deck;
}

impl<S: KeyValueStore> DeckSource for CardStore<S> {
    fn load(&self) -> Deck {
        CardStore::load(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Timer running, top card accepts input.
    Active,
    /// Timer frozen because the app is in the background.
    Paused,
    /// Out of time. Cards stay visible but inert.
    Expired,
    /// Deck exhausted. Only a reset leaves this state.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Tick,
    Foreground,
    Background,
    RemoveTop,
    RemoveAt(usize),
    Reset,
}

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub remaining_time: u32,
    pub is_active: bool,
    pub cards_left: usize,
    pub accepts_input: bool,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    deck: Deck,
    initial_duration: u32,
    remaining_time: u32,
    is_active: bool,
}

impl SessionController {
    /// Start a session the way a launch does: by resetting from `source`.
    pub fn start(initial_duration: u32, source: &impl DeckSource) -> Self {
        let mut session = Self {
            deck: Deck::new(),
            initial_duration,
            remaining_time: initial_duration,
            is_active: false,
        };
        session.reset(source);
        session
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn state(&self) -> SessionState {
        if self.deck.is_empty() {
            SessionState::Completed
        } else if self.remaining_time == 0 {
            SessionState::Expired
        } else if self.is_active {
            SessionState::Active
        } else {
            SessionState::Paused
        }
    }

    /// The top card takes input only while there is time and a card left.
    pub fn accepts_input(&self) -> bool {
        self.remaining_time > 0 && !self.deck.is_empty()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            remaining_time: self.remaining_time,
            is_active: self.is_active,
            cards_left: self.deck.len(),
            accepts_input: self.accepts_input(),
        }
    }

    /// Apply one event. Returns the new snapshot if anything observable changed.
    pub fn handle(
        &mut self,
        event: SessionEvent,
        source: &impl DeckSource,
    ) -> Option<SessionSnapshot> {
        let before = self.snapshot();
        match event {
            SessionEvent::Tick => self.tick(),
            SessionEvent::Foreground => self.foreground(),
            SessionEvent::Background => self.background(),
            SessionEvent::RemoveTop => {
                self.remove_top_card();
            }
            SessionEvent::RemoveAt(index) => {
                self.remove_card_at(index);
            }
            // Reloading can change the deck without changing the snapshot,
            // so a reset always reports.
            SessionEvent::Reset => {
                self.reset(source);
                return Some(self.snapshot());
            }
        }
        let after = self.snapshot();
        (after != before).then_some(after)
    }

    pub fn tick(&mut self) {
        if !self.is_active || self.remaining_time == 0 {
            return;
        }
        self.remaining_time -= 1;
        if self.remaining_time == 0 {
            info!(cards_left = self.deck.len(), "session time expired");
        }
    }

    pub fn foreground(&mut self) {
        if !self.deck.is_empty() && !self.is_active {
            debug!("session resumed");
            self.is_active = true;
        }
    }

    pub fn background(&mut self) {
        if self.is_active {
            debug!("session paused");
        }
        self.is_active = false;
    }

    pub fn remove_top_card(&mut self) -> Option<Card> {
        self.deck.top_index().and_then(|index| self.remove_card_at(index))
    }

    pub fn remove_card_at(&mut self, index: usize) -> Option<Card> {
        if !self.accepts_input() {
            debug!(index, "removal ignored while input is blocked");
            return None;
        }
        let removed = self.deck.remove_at(index);
        if removed.is_none() {
            debug!(index, cards = self.deck.len(), "removal index out of range");
            return None;
        }
        if self.deck.is_empty() {
            self.is_active = false;
            info!(remaining_time = self.remaining_time, "deck completed");
        }
        removed
    }

    pub fn reset(&mut self, source: &impl DeckSource) {
        self.deck = source.load();
        self.remaining_time = self.initial_duration;
        self.is_active = !self.deck.is_empty();
        info!(
            cards = self.deck.len(),
            seconds = self.initial_duration,
            "session reset"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    struct Fixed(Deck);

    impl DeckSource for Fixed {
        fn load(&self) -> Deck {
            self.0.clone()
        }
    }

    fn card(name: &str) -> Card {
        Card::new(name, name.to_lowercase())
    }

    fn abc() -> Fixed {
        Fixed(Deck::from(vec![card("A"), card("B"), card("C")]))
    }

    fn session(source: &Fixed) -> SessionController {
        SessionController::start(DEFAULT_SESSION_SECONDS, source)
    }

    #[test]
    fn test_starts_active_with_full_time() {
        let source = abc();
        let s = session(&source);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.remaining_time(), 100);
        assert!(s.is_active());
        assert_eq!(s.deck().len(), 3);
    }

    #[test]
    fn test_remove_top_card_keeps_session_active() {
        let source = abc();
        let mut s = session(&source);

        let removed = s.remove_top_card();
        assert_eq!(removed, Some(card("C")));
        assert_eq!(s.deck(), &Deck::from(vec![card("A"), card("B")]));
        assert_eq!(s.deck().top(), Some(&card("B")));
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn test_removing_last_card_completes() {
        let source = Fixed(Deck::from(vec![card("A")]));
        let mut s = session(&source);

        s.remove_top_card();
        assert!(s.deck().is_empty());
        assert_eq!(s.state(), SessionState::Completed);
        assert!(!s.is_active());
        assert!(!s.accepts_input());
    }

    #[test]
    fn test_out_of_range_removal_is_ignored() {
        let source = abc();
        let mut s = session(&source);

        assert_eq!(s.remove_card_at(3), None);
        assert_eq!(s.handle(SessionEvent::RemoveAt(99), &source), None);
        assert_eq!(s.deck().len(), 3);
    }

    #[test]
    fn test_tick_decrements_when_active() {
        let source = abc();
        let mut s = session(&source);

        s.tick();
        assert_eq!(s.remaining_time(), 99);
    }

    #[test]
    fn test_tick_is_noop_when_paused() {
        let source = abc();
        let mut s = session(&source);

        s.background();
        assert_eq!(s.state(), SessionState::Paused);
        s.tick();
        assert_eq!(s.remaining_time(), 100);
    }

    #[test]
    fn test_tick_is_noop_when_completed() {
        let source = Fixed(Deck::from(vec![card("A")]));
        let mut s = session(&source);

        s.remove_top_card();
        s.tick();
        assert_eq!(s.remaining_time(), 100);
    }

    #[test]
    fn test_last_second_expires_without_touching_deck() {
        let source = abc();
        let mut s = session(&source);
        for _ in 0..99 {
            s.tick();
        }
        assert_eq!(s.remaining_time(), 1);

        s.tick();
        assert_eq!(s.remaining_time(), 0);
        assert_eq!(s.state(), SessionState::Expired);
        assert!(!s.accepts_input());
        assert_eq!(s.deck().len(), 3);

        s.tick();
        assert_eq!(s.remaining_time(), 0);
    }

    #[test]
    fn test_expired_blocks_removal() {
        let source = abc();
        let mut s = SessionController::start(1, &source);
        s.tick();

        assert_eq!(s.remove_top_card(), None);
        assert_eq!(s.deck().len(), 3);
        assert_eq!(s.state(), SessionState::Expired);
    }

    #[test]
    fn test_foreground_resumes_only_with_cards() {
        let source = Fixed(Deck::from(vec![card("A")]));
        let mut s = session(&source);

        s.background();
        s.foreground();
        assert_eq!(s.state(), SessionState::Active);

        s.remove_top_card();
        s.background();
        s.foreground();
        assert!(!s.is_active());
        assert_eq!(s.state(), SessionState::Completed);
    }

    #[test]
    fn test_background_pauses_regardless_of_deck() {
        let source = abc();
        let mut s = session(&source);

        let snapshot = s.handle(SessionEvent::Background, &source).unwrap();
        assert_eq!(snapshot.state, SessionState::Paused);
        assert!(!snapshot.is_active);
        // Pausing twice is not a change.
        assert_eq!(s.handle(SessionEvent::Background, &source), None);
    }

    #[test]
    fn test_reset_restores_time_and_deck_from_any_state() {
        let source = abc();
        let mut s = SessionController::start(100, &source);

        for _ in 0..100 {
            s.tick();
        }
        s.background();
        assert_eq!(s.state(), SessionState::Expired);

        let snapshot = s.handle(SessionEvent::Reset, &source).unwrap();
        assert_eq!(snapshot.remaining_time, 100);
        assert_eq!(snapshot.state, SessionState::Active);
        assert_eq!(snapshot.cards_left, 3);
    }

    #[test]
    fn test_reset_after_completion() {
        let source = Fixed(Deck::from(vec![card("A")]));
        let mut s = session(&source);
        s.handle(SessionEvent::RemoveTop, &source);
        assert_eq!(s.state(), SessionState::Completed);

        s.handle(SessionEvent::Reset, &source);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.deck().top(), Some(&card("A")));
    }

    #[test]
    fn test_reset_with_empty_saved_deck_completes_immediately() {
        let source = Fixed(Deck::new());
        let s = session(&source);
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.remaining_time(), 100);
        assert!(!s.is_active());
    }

    #[test]
    fn test_reset_reloads_from_card_store() {
        let mut store = CardStore::new(MemoryStore::default());
        let mut s = SessionController::start(DEFAULT_SESSION_SECONDS, &store);
        assert_eq!(s.deck(), &Deck::example());

        store.save(&abc().0).unwrap();
        s.handle(SessionEvent::Reset, &store);
        assert_eq!(s.deck(), &abc().0);
    }

    #[test]
    fn test_handle_reports_changes() {
        let source = abc();
        let mut s = session(&source);

        let snapshot = s.handle(SessionEvent::Tick, &source).unwrap();
        assert_eq!(snapshot.remaining_time, 99);

        let snapshot = s.handle(SessionEvent::RemoveTop, &source).unwrap();
        assert_eq!(snapshot.cards_left, 2);
        assert!(snapshot.accepts_input);

        // Already active, nothing to report.
        assert_eq!(s.handle(SessionEvent::Foreground, &source), None);
    }
}
