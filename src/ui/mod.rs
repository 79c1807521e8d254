//! TUI module for the flashcard pile.

mod app;
mod theme;
mod widgets;

pub use app::App;
