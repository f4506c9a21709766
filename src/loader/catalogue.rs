//! Panel catalogues and deck layout files.
//!
//! Catalogue lines are `id,width,height[,image]`; layout lines hold one row
//! of panel ids separated by commas or whitespace. In both, `#` starts a
//! comment and blank lines are ignored.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{DeckSpec, PanelMap, PanelSpec};
use crate::render::image_loader;

/// Reads a panel catalogue file.
///
/// Relative image paths are resolved against the catalogue's directory.
pub fn read_catalogue(path: &Path) -> Result<PanelMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read panel catalogue: {:?}", path))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let panels = parse_catalogue(&text, base)
        .with_context(|| format!("Invalid panel catalogue: {:?}", path))?;
    info!("Loaded {} panels from {:?}", panels.len(), path);
    Ok(panels)
}

/// Parses catalogue text, resolving relative image paths against `base`.
pub fn parse_catalogue(text: &str, base: &Path) -> Result<PanelMap> {
    let mut panels = PanelMap::new();

    for (idx, line) in content_lines(text) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if !(3..=4).contains(&fields.len()) {
            bail!(
                "line {}: expected 'id,width,height[,image]', found {} fields",
                idx,
                fields.len()
            );
        }

        let id = fields[0];
        if id.is_empty() {
            bail!("line {}: empty panel id", idx);
        }
        let width: u32 = fields[1]
            .parse()
            .with_context(|| format!("line {}: invalid width '{}'", idx, fields[1]))?;
        let height: u32 = fields[2]
            .parse()
            .with_context(|| format!("line {}: invalid height '{}'", idx, fields[2]))?;
        let image = fields
            .get(3)
            .filter(|p| !p.is_empty())
            .map(|p| resolve(base, Path::new(p)));

        let panel = PanelSpec::new(id, width, height, image)
            .with_context(|| format!("line {}", idx))?;
        if panels.insert(id.to_string(), panel).is_some() {
            bail!("line {}: duplicate panel id '{}'", idx, id);
        }
    }

    Ok(panels)
}

/// Builds a panel map from every image file under `dir`.
///
/// Each file becomes a panel whose id is the file stem and whose declared
/// size is the image's pixel size. Unreadable images are skipped with a
/// warning.
pub fn scan_panel_dir(dir: &Path) -> Result<PanelMap> {
    if !dir.is_dir() {
        bail!("Panel directory does not exist: {:?}", dir);
    }

    let mut panels = PanelMap::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", dir))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !image_loader::is_image_path(path) {
            continue;
        }

        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping panel image with non-UTF-8 name: {:?}", path);
            continue;
        };

        let (width, height) = match image_loader::read_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!("Skipping unreadable panel image {:?}: {}", path, e);
                continue;
            }
        };

        let panel = PanelSpec::new(id, width, height, Some(path.to_path_buf()))?;
        if let Some(previous) = panels.insert(id.to_string(), panel) {
            bail!(
                "Duplicate panel id '{}' for {:?} and {:?}",
                id,
                previous.image_path(),
                path
            );
        }
        debug!(id, width, height, "Discovered panel image");
    }

    info!("Scanned {} panels under {:?}", panels.len(), dir);
    Ok(panels)
}

/// Reads a deck layout file into a validated deck.
pub fn read_layout(path: &Path) -> Result<DeckSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read deck layout: {:?}", path))?;
    parse_layout(&text).with_context(|| format!("Invalid deck layout: {:?}", path))
}

/// Parses layout text; the first row fixes the column count.
pub fn parse_layout(text: &str) -> Result<DeckSpec> {
    let rows: Vec<Vec<String>> = content_lines(text)
        .map(|(_, line)| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect();

    Ok(DeckSpec::from_rows(rows)?)
}

/// Non-blank lines with comments stripped, paired with 1-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(idx, line)| {
        let line = line.split('#').next().unwrap_or("").trim();
        (!line.is_empty()).then_some((idx + 1, line))
    })
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
