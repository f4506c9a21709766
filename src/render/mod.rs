//! Raster output: deck mosaics and grid heatmaps.

pub mod deck_renderer;
pub mod heatmap;
pub mod image_loader;

pub use deck_renderer::DeckRenderer;
pub use heatmap::{render_heatmap, save_heatmap, ColorScale, HeatmapOptions};
