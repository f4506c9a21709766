use crate::error::DeckError;
use crate::models::{DeckSpec, PanelMap, PanelSpec};

/// Where one panel lands on the mosaic canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub panel_id: String,
    pub row: usize,
    pub col: usize,
    /// Left edge of the cell, in canvas pixels.
    pub x: u32,
    /// Top edge of the cell, in canvas pixels.
    pub y: u32,
    /// Declared panel width; the panel image is resized to exactly this.
    pub width: u32,
    /// Declared panel height.
    pub height: u32,
}

/// Grid geometry of a deck mosaic.
///
/// Row heights and column widths are the maximum declared panel dimension
/// across the row or column, so a cell can be larger than the panel placed
/// in it. Panels keep their own declared size and sit at the top-left of
/// their cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicLayout {
    pub row_heights: Vec<u32>,
    pub col_widths: Vec<u32>,
    /// Placements in row-major order.
    pub placements: Vec<Placement>,
}

impl MosaicLayout {
    /// Computes the mosaic geometry for a deck.
    ///
    /// # Algorithm
    /// 1. `row_heights[r]` = max panel height in row r.
    /// 2. `col_widths[c]` = max panel width in column c across all rows.
    /// 3. Walk rows top to bottom, columns left to right, advancing x by
    ///    `col_widths[c]` (reset per row) and y by `row_heights[r]`.
    ///
    /// Fails if a layout id has no panel in `panels`, or if either canvas
    /// dimension does not fit in a `u32`.
    pub fn compute(deck: &DeckSpec, panels: &PanelMap) -> Result<Self, DeckError> {
        let mut row_heights = vec![0u32; deck.rows()];
        let mut col_widths = vec![0u32; deck.cols()];
        for (r, c, id) in deck.positions() {
            let panel = lookup(panels, id)?;
            row_heights[r] = row_heights[r].max(panel.height());
            col_widths[c] = col_widths[c].max(panel.width());
        }

        // Offsets never exceed these totals, so the walk below cannot overflow.
        let width = total(&col_widths);
        let height = total(&row_heights);
        if width > u64::from(u32::MAX) || height > u64::from(u32::MAX) {
            return Err(DeckError::CanvasTooLarge { width, height });
        }

        let mut placements = Vec::with_capacity(deck.rows() * deck.cols());
        let mut y_offset = 0u32;
        for (r, ids) in deck.layout().iter().enumerate() {
            let mut x_offset = 0u32;
            for (c, id) in ids.iter().enumerate() {
                let panel = lookup(panels, id)?;
                placements.push(Placement {
                    panel_id: id.clone(),
                    row: r,
                    col: c,
                    x: x_offset,
                    y: y_offset,
                    width: panel.width(),
                    height: panel.height(),
                });
                x_offset += col_widths[c];
            }
            y_offset += row_heights[r];
        }

        Ok(Self {
            row_heights,
            col_widths,
            placements,
        })
    }

    /// Canvas (width, height): the sums of column widths and row heights.
    ///
    /// `compute` guarantees both sums fit in a `u32`.
    pub fn canvas_size(&self) -> (u32, u32) {
        let clamp = |sum: u64| u32::try_from(sum).unwrap_or(u32::MAX);
        (clamp(total(&self.col_widths)), clamp(total(&self.row_heights)))
    }

    /// Size of the cell at (row, col), which may exceed its panel.
    pub fn cell_size(&self, row: usize, col: usize) -> Option<(u32, u32)> {
        Some((*self.col_widths.get(col)?, *self.row_heights.get(row)?))
    }

    pub fn placement(&self, row: usize, col: usize) -> Option<&Placement> {
        let cols = self.col_widths.len();
        if col >= cols {
            return None;
        }
        self.placements.get(row * cols + col)
    }

    /// Canvas pixels not covered by any panel.
    pub fn uncovered_area(&self) -> u64 {
        let (w, h) = self.canvas_size();
        let covered: u64 = self
            .placements
            .iter()
            .map(|p| p.width as u64 * p.height as u64)
            .sum();
        (w as u64 * h as u64).saturating_sub(covered)
    }
}

fn total(sizes: &[u32]) -> u64 {
    sizes.iter().map(|&s| u64::from(s)).sum()
}

fn lookup<'a>(panels: &'a PanelMap, id: &str) -> Result<&'a PanelSpec, DeckError> {
    panels.get(id).ok_or_else(|| DeckError::PanelNotFound {
        panel_id: id.to_string(),
    })
}
