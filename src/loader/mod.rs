//! Readers that turn files into panel catalogues, deck layouts and grids.

pub mod catalogue;
pub mod grid_loader;
pub mod table;

pub use catalogue::{read_catalogue, read_layout, scan_panel_dir};
pub use grid_loader::{GridLoader, LoadOutcome};
pub use table::{parse_table, read_table, TableError};
