use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::DeckError;

/// Panel catalogue handed to the renderer, keyed by panel id.
pub type PanelMap = HashMap<String, PanelSpec>;

/// One physical panel: declared size in device units and its source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSpec {
    id: String,
    width: u32,
    height: u32,
    image_path: Option<PathBuf>,
}

impl PanelSpec {
    /// Creates a panel, rejecting zero width or height.
    pub fn new(
        id: impl Into<String>,
        width: u32,
        height: u32,
        image_path: Option<PathBuf>,
    ) -> Result<Self, DeckError> {
        let id = id.into();
        if width == 0 || height == 0 {
            return Err(DeckError::InvalidPanel {
                panel_id: id,
                width,
                height,
            });
        }
        Ok(Self {
            id,
            width,
            height,
            image_path,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Declared (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    /// Returns the image path only if it resolves to an existing file.
    pub fn resolved_image(&self) -> Option<&Path> {
        self.image_path().filter(|p| p.is_file())
    }
}

/// Builds a panel map from specs, keyed by their ids.
///
/// A later panel with the same id replaces an earlier one.
pub fn panel_map(panels: impl IntoIterator<Item = PanelSpec>) -> PanelMap {
    panels
        .into_iter()
        .map(|p| (p.id().to_string(), p))
        .collect()
}
