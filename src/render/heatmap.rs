//! Raster heatmaps of deck grids.
//!
//! Each grid cell becomes a `cell_size` square coloured by its value on a
//! colour scale spanning the grid's finite minimum and maximum.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::DeckError;
use crate::models::DeckGrid;
use crate::render::image_loader;

/// Default edge length of one grid cell in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 40;

/// Built-in colour scales, sampled at evenly spaced stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScale {
    #[default]
    Viridis,
    Plasma,
    Greys,
}

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

const PLASMA: [[u8; 3]; 5] = [
    [13, 8, 135],
    [126, 3, 168],
    [204, 71, 120],
    [248, 149, 64],
    [240, 249, 33],
];

const GREYS: [[u8; 3]; 2] = [[255, 255, 255], [0, 0, 0]];

impl ColorScale {
    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::Plasma => &PLASMA,
            Self::Greys => &GREYS,
        }
    }

    /// Colour at position `t` in `[0, 1]`; out-of-range input is clamped.
    pub fn sample(self, t: f64) -> Rgba<u8> {
        let stops = self.stops();
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lower as f64;

        let (a, b) = (stops[lower], stops[lower + 1]);
        let mix = |i: usize| {
            (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8
        };
        Rgba([mix(0), mix(1), mix(2), 255])
    }
}

impl FromStr for ColorScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viridis" => Ok(Self::Viridis),
            "plasma" => Ok(Self::Plasma),
            "greys" | "grays" => Ok(Self::Greys),
            other => Err(format!("unknown colour scale '{other}'")),
        }
    }
}

/// Options for rendering a grid heatmap.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapOptions {
    pub cell_size: u32,
    pub colorscale: ColorScale,
    /// Fill for NaN or infinite cells.
    pub missing_color: Rgba<u8>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            colorscale: ColorScale::default(),
            missing_color: Rgba([200, 200, 200, 255]),
        }
    }
}

/// Renders a grid as a heatmap; row 0 is drawn at the top.
///
/// Fails with `CanvasTooLarge` when the grid shape times the cell size does
/// not fit in a `u32` image dimension.
pub fn render_heatmap(grid: &DeckGrid, options: &HeatmapOptions) -> Result<RgbaImage, DeckError> {
    let size = options.cell_size.max(1);
    let (rows, cols) = grid.shape();
    let width = extent(cols, size);
    let height = extent(rows, size);
    let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(DeckError::CanvasTooLarge { width, height });
    };

    let range = grid.value_range();
    let colors: Vec<Rgba<u8>> = grid
        .cells()
        .iter()
        .map(|cell| match range {
            Some((lo, hi)) if cell.value.is_finite() => {
                let t = if hi > lo { (cell.value - lo) / (hi - lo) } else { 0.5 };
                options.colorscale.sample(t)
            }
            _ => options.missing_color,
        })
        .collect();

    let size = size as usize;
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let row = y as usize / size;
        let col = x as usize / size;
        colors[row * cols + col]
    });

    debug!(rows, cols, cell_size = size, "Rendered grid heatmap");
    Ok(img)
}

/// Pixel length of `count` cells of edge `size`.
fn extent(count: usize, size: u32) -> u64 {
    u64::try_from(count)
        .unwrap_or(u64::MAX)
        .saturating_mul(u64::from(size))
}

/// Renders a grid heatmap and writes it to `path`.
pub fn save_heatmap(
    grid: &DeckGrid,
    path: &Path,
    options: &HeatmapOptions,
) -> Result<PathBuf, DeckError> {
    image_loader::output_format(path)?;
    let img = render_heatmap(grid, options)?;
    image_loader::save_image(DynamicImage::ImageRgba8(img), path)?;
    info!(?path, "Saved grid heatmap");
    Ok(path.to_path_buf())
}
