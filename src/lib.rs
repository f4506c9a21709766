//! Screen deck layouts: panel mosaics and measured deck grids.
//!
//! Two halves share the same rectangular-grid discipline:
//! - `DeckRenderer` composes a mosaic image from a `DeckSpec` and its panels.
//! - `DeckGrid` holds a deck's measured values; `ScreenStore` persists them
//!   per (screen, deck) name pair.

pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod loader;
pub mod models;
pub mod render;

pub use config::RenderOptions;
pub use error::{DeckError, ImageLoadError, ShapeError};
pub use layout::{MosaicLayout, Placement};
pub use models::{
    panel_map, DeckGrid, DeckId, DeckSpec, DeckSummary, GridCell, PanelMap, PanelSpec,
    ScreenDeck, ScreenStore,
};
pub use render::{DeckRenderer, HeatmapOptions};
