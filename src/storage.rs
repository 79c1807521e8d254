//! Storage module for persisting the card list in a local key-value store.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::{Card, Deck};

/// Key the card list is stored under.
pub const CARDS_KEY: &str = "cards";

/// Minimal key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// Key-value store backed by one file per key.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory: {:?}", dir))?;
        Ok(Self { dir })
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flashpile")
            .join("store")
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to read {:?}", path)),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {:?}", path))
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, Vec<u8>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Source of truth for the persisted card list.
pub struct CardStore<S> {
    store: S,
}

impl<S: KeyValueStore> CardStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the saved deck. Missing or unreadable data yields the example deck.
    pub fn load(&self) -> Deck {
        self.read_saved().unwrap_or_else(|| {
            debug!("using example deck");
            Deck::example()
        })
    }

    /// The cards the user has actually saved. Missing or unreadable data
    /// yields an empty list, never the example deck.
    pub fn saved_cards(&self) -> Deck {
        self.read_saved().unwrap_or_default()
    }

    fn read_saved(&self) -> Option<Deck> {
        let bytes = match self.store.get(CARDS_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no saved cards");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "failed to read saved cards");
                return None;
            }
        };

        match serde_json::from_slice::<Deck>(&bytes) {
            Ok(deck) => {
                debug!(cards = deck.len(), "loaded saved cards");
                Some(deck)
            }
            Err(err) => {
                warn!(error = %err, "saved cards are unreadable");
                None
            }
        }
    }

    /// Write the deck under the cards key.
    pub fn save(&mut self, deck: &Deck) -> Result<()> {
        let json = serde_json::to_vec(deck).context("Failed to encode cards")?;
        self.store.set(CARDS_KEY, &json)?;
        debug!(cards = deck.len(), "saved cards");
        Ok(())
    }

    pub fn replace_all(&mut self, deck: Deck) -> Result<()> {
        self.save(&deck)
    }

    /// Add a card to the saved list. New cards go to the bottom of the pile.
    pub fn add_card(&mut self, card: Card) -> Result<Deck> {
        let mut deck = self.saved_cards();
        deck.insert_bottom(card);
        self.save(&deck)?;
        Ok(deck)
    }

    /// Delete the saved card at `index`, returning the remaining list.
    pub fn delete_card(&mut self, index: usize) -> Result<(Option<Card>, Deck)> {
        let mut deck = self.saved_cards();
        let removed = deck.remove_at(index);
        if removed.is_some() {
            self.save(&deck)?;
        }
        Ok((removed, deck))
    }

    /// Import `prompt,answer` rows from a CSV file, appended to the saved
    /// cards or replacing them. Returns the number imported.
    pub fn import_csv(&mut self, csv_path: &Path, replace: bool) -> Result<usize> {
        let content = fs::read_to_string(csv_path)
            .with_context(|| format!("Failed to read CSV file: {:?}", csv_path))?;
        let mut deck = if replace { Deck::new() } else { self.saved_cards() };
        let mut imported = 0;

        for (i, line) in content.lines().enumerate() {
            // Skip header
            if i == 0 {
                let lower = line.to_lowercase();
                if lower.contains("prompt") || lower.contains("front") {
                    continue;
                }
            }

            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() >= 2 {
                let prompt = parts[0].trim();
                let answer = parts[1].trim();

                if !prompt.is_empty() && !answer.is_empty() {
                    deck.push(Card::new(prompt, answer));
                    imported += 1;
                }
            }
        }

        self.replace_all(deck)?;
        Ok(imported)
    }
}
