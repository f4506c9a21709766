//! Defaults shared by the renderer, the heatmap and the deck store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use image::imageops::FilterType;
use image::Rgba;

/// Environment variable overriding the deck database location.
pub const DB_PATH_ENV: &str = "GEOMET_SCREEN_DB";

/// File name of the deck database inside the data directory.
const DB_FILE_NAME: &str = "screen.sqlite";

/// Opaque white.
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Options for composing a deck mosaic.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Canvas fill behind and between panels.
    pub background: Rgba<u8>,
    /// Filter used when resizing panel images to their declared size.
    pub filter: FilterType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            // CatmullRom is a bicubic filter with a good quality/speed balance
            filter: FilterType::CatmullRom,
        }
    }
}

/// Returns the deck database path, creating its parent directory.
///
/// `GEOMET_SCREEN_DB` wins when set; otherwise the platform data directory
/// is used (e.g. `XDG_DATA_HOME/geomet-screen/screen.sqlite`).
pub fn default_db_path() -> Result<PathBuf> {
    let path = match std::env::var_os(DB_PATH_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => {
            let proj_dirs = ProjectDirs::from("", "", "geomet-screen")
                .context("Failed to determine project directories")?;
            proj_dirs.data_dir().join(DB_FILE_NAME)
        }
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
    }

    Ok(path)
}
