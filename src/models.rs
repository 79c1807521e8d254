//! Data models for cards and the study deck.

use serde::{Deserialize, Serialize};

/// A single prompt/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub prompt: String,
    pub answer: String,
}

impl Card {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }

    /// The card shown when nothing has been saved yet.
    pub fn example() -> Self {
        Self::new("What is 2 + 2?", "4")
    }
}

/// An ordered pile of cards. The last card is the top of the pile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn example() -> Self {
        Self::from(vec![Card::example()])
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// Index of the top (interactive) card.
    pub fn top_index(&self) -> Option<usize> {
        self.cards.len().checked_sub(1)
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    /// Remove the card at `index`. Out-of-range indices leave the deck untouched.
    pub fn remove_at(&mut self, index: usize) -> Option<Card> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    /// Put a card at the bottom of the pile.
    pub fn insert_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}
