//! Error types for deck layouts, mosaics and grids.

use std::path::PathBuf;

use thiserror::Error;

/// A two-dimensional structure was not rectangular, or a cell set did not
/// cover its declared shape exactly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("grid has no rows or no columns")]
    Empty,

    #[error("row {row} has {found} entries, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cell ({row}, {col}) lies outside a {rows}x{cols} grid")]
    CellOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("cell ({row}, {col}) appears more than once")]
    DuplicateCell { row: usize, col: usize },

    #[error("cell ({row}, {col}) is missing")]
    MissingCell { row: usize, col: usize },

    #[error("grid shape {rows}x{cols} is too large")]
    TooLarge { rows: usize, cols: usize },

    #[error("{found} cells cannot fill a {rows}x{cols} grid")]
    CellCount {
        rows: usize,
        cols: usize,
        found: usize,
    },
}

/// Failure to read a raster resource from disk.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to read image file")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("animated image has no frames")]
    NoFrames,
}

/// Errors raised while building a deck or composing its mosaic.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("panel id '{panel_id}' not found in panel mapping")]
    PanelNotFound { panel_id: String },

    #[error("image for panel '{panel_id}' not found at {}", display_path(.path))]
    ImageMissing {
        panel_id: String,
        path: Option<PathBuf>,
    },

    #[error("panel '{panel_id}' has invalid dimensions {width}x{height}")]
    InvalidPanel {
        panel_id: String,
        width: u32,
        height: u32,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("image of {width}x{height} pixels exceeds the maximum image size")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("failed to load image for panel '{panel_id}' from {path:?}")]
    PanelImage {
        panel_id: String,
        path: PathBuf,
        #[source]
        source: ImageLoadError,
    },

    #[error("cannot determine an image format for output {path:?}")]
    UnsupportedOutput { path: PathBuf },

    #[error("i/o error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode image to {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<no image reference>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_names_panel() {
        let err = DeckError::PanelNotFound {
            panel_id: "X".to_string(),
        };
        assert!(err.to_string().contains("'X'"));
    }

    #[test]
    fn test_missing_image_without_reference() {
        let err = DeckError::ImageMissing {
            panel_id: "P1".to_string(),
            path: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("P1"));
        assert!(msg.contains("<no image reference>"));
    }

    #[test]
    fn test_shape_error_is_transparent() {
        let err: DeckError = ShapeError::Ragged {
            row: 2,
            expected: 3,
            found: 1,
        }
        .into();
        assert_eq!(err.to_string(), "row 2 has 1 entries, expected 3");
    }
}
