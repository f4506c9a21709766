pub mod deck;
pub mod grid;
pub mod panel;
pub mod screen_deck;
pub mod screen_store;

pub use deck::*;
pub use grid::*;
pub use panel::*;
pub use screen_deck::*;
pub use screen_store::*;
