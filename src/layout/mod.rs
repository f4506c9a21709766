pub mod mosaic;

pub use mosaic::{MosaicLayout, Placement};
