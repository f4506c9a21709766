//! Measured deck grids.
//!
//! A `DeckGrid` owns one `GridCell` per (row, col) position of a rectangular
//! table. Cells are kept in row-major order so extraction reproduces the
//! original table exactly.

use xxhash_rust::xxh3::xxh3_64;

use crate::error::ShapeError;

/// Store-assigned identifier of a screen deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeckId(pub i64);

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One measured value at a zero-based (row, col) coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Owning deck, once the deck has been persisted.
    pub deck_id: Option<DeckId>,
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Rectangular collection of grid cells for one deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckGrid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
}

impl DeckGrid {
    /// Builds a grid from a rectangular table of values.
    ///
    /// Fails without creating anything if the table is empty or any row
    /// differs in length from the first.
    pub fn assemble<R: AsRef<[f64]>>(table: &[R]) -> Result<Self, ShapeError> {
        let rows = table.len();
        let cols = table.first().map_or(0, |r| r.as_ref().len());
        if rows == 0 || cols == 0 {
            return Err(ShapeError::Empty);
        }

        for (row, values) in table.iter().enumerate() {
            let found = values.as_ref().len();
            if found != cols {
                return Err(ShapeError::Ragged {
                    row,
                    expected: cols,
                    found,
                });
            }
        }

        let cells = table
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .as_ref()
                    .iter()
                    .enumerate()
                    .map(move |(col, &value)| GridCell {
                        deck_id: None,
                        row,
                        col,
                        value,
                    })
            })
            .collect();

        Ok(Self { rows, cols, cells })
    }

    /// Rebuilds a grid from an unordered cell set of a declared shape.
    ///
    /// Every position in `0..rows x 0..cols` must appear exactly once.
    pub fn from_cells(
        rows: usize,
        cols: usize,
        cells: impl IntoIterator<Item = GridCell>,
    ) -> Result<Self, ShapeError> {
        if rows == 0 || cols == 0 {
            return Err(ShapeError::Empty);
        }

        let len = rows
            .checked_mul(cols)
            .ok_or(ShapeError::TooLarge { rows, cols })?;
        let mut slots: Vec<Option<GridCell>> = vec![None; len];
        for cell in cells {
            if cell.row >= rows || cell.col >= cols {
                return Err(ShapeError::CellOutOfRange {
                    row: cell.row,
                    col: cell.col,
                    rows,
                    cols,
                });
            }
            let slot = &mut slots[cell.row * cols + cell.col];
            if slot.is_some() {
                return Err(ShapeError::DuplicateCell {
                    row: cell.row,
                    col: cell.col,
                });
            }
            *slot = Some(cell);
        }

        let cells = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or(ShapeError::MissingCell {
                    row: i / cols,
                    col: i % cols,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows, cols, cells })
    }

    /// Returns the values as a table of shape (rows, cols), row 0 first.
    pub fn extract(&self) -> Vec<Vec<f64>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.value).collect())
            .collect()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col].value)
    }

    pub fn row_values(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(
            self.cells[start..start + self.cols]
                .iter()
                .map(|c| c.value)
                .collect(),
        )
    }

    pub fn column_values(&self, col: usize) -> Option<Vec<f64>> {
        if col >= self.cols {
            return None;
        }
        Some(
            self.cells
                .iter()
                .skip(col)
                .step_by(self.cols)
                .map(|c| c.value)
                .collect(),
        )
    }

    /// Minimum and maximum over finite values; `None` if there are none.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .map(|c| c.value)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Mean over finite values.
    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self
            .cells
            .iter()
            .map(|c| c.value)
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Hash of the shape and every value bit pattern, row-major.
    pub fn fingerprint(&self) -> u64 {
        let mut data = Vec::with_capacity(16 + self.cells.len() * 8);
        data.extend_from_slice(&(self.rows as u64).to_le_bytes());
        data.extend_from_slice(&(self.cols as u64).to_le_bytes());
        for cell in &self.cells {
            data.extend_from_slice(&cell.value.to_bits().to_le_bytes());
        }
        xxh3_64(&data)
    }

    /// Stamps every cell with the owning deck id.
    pub(crate) fn bind(&mut self, deck_id: DeckId) {
        for cell in &mut self.cells {
            cell.deck_id = Some(deck_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_5x5() -> Vec<Vec<f64>> {
        vec![
            vec![10.5, 12.3, 11.8, 13.2, 10.9],
            vec![9.8, 11.5, 10.2, 12.7, 11.3],
            vec![11.2, 10.8, 12.5, 11.9, 10.5],
            vec![12.1, 11.7, 10.3, 11.4, 12.8],
            vec![10.7, 12.9, 11.1, 10.6, 11.8],
        ]
    }

    #[test]
    fn test_assemble_extract_5x5() {
        let table = sample_5x5();
        let grid = DeckGrid::assemble(&table).unwrap();
        assert_eq!(grid.shape(), (5, 5));
        assert_eq!(grid.len(), 25);
        assert_eq!(grid.extract(), table);
    }

    #[test]
    fn test_round_trip_non_square() {
        let table = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let grid = DeckGrid::assemble(&table).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.extract(), table);
        assert_eq!(grid.get(1, 0), Some(4.0));
        assert_eq!(grid.get(0, 2), Some(3.0));
    }

    #[test]
    fn test_cells_are_contiguous_row_major() {
        let grid = DeckGrid::assemble(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let coords: Vec<_> = grid.cells().iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(grid.cells().iter().all(|c| c.deck_id.is_none()));
    }

    #[test]
    fn test_ragged_input_rejected() {
        let table = vec![vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0]];
        let err = DeckGrid::assemble(&table).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(DeckGrid::assemble(&empty), Err(ShapeError::Empty));
        assert_eq!(
            DeckGrid::assemble(&[Vec::<f64>::new()]),
            Err(ShapeError::Empty)
        );
    }

    #[test]
    fn test_from_cells_reorders() {
        let grid = DeckGrid::assemble(&sample_5x5()).unwrap();
        let mut shuffled = grid.cells().to_vec();
        shuffled.reverse();
        let rebuilt = DeckGrid::from_cells(5, 5, shuffled).unwrap();
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn test_from_cells_detects_gaps_and_duplicates() {
        let cell = |row, col| GridCell {
            deck_id: None,
            row,
            col,
            value: 0.0,
        };

        let err = DeckGrid::from_cells(1, 2, vec![cell(0, 0)]).unwrap_err();
        assert_eq!(err, ShapeError::MissingCell { row: 0, col: 1 });

        let err = DeckGrid::from_cells(1, 2, vec![cell(0, 0), cell(0, 0)]).unwrap_err();
        assert_eq!(err, ShapeError::DuplicateCell { row: 0, col: 0 });

        let err = DeckGrid::from_cells(1, 2, vec![cell(0, 0), cell(1, 1)]).unwrap_err();
        assert!(matches!(err, ShapeError::CellOutOfRange { row: 1, col: 1, .. }));
    }

    #[test]
    fn test_from_cells_overflowing_shape() {
        let err = DeckGrid::from_cells(usize::MAX, 2, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            ShapeError::TooLarge {
                rows: usize::MAX,
                cols: 2
            }
        );
    }

    #[test]
    fn test_row_and_column_queries() {
        let grid = DeckGrid::assemble(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(grid.row_values(1), Some(vec![4.0, 5.0, 6.0]));
        assert_eq!(grid.column_values(2), Some(vec![3.0, 6.0]));
        assert_eq!(grid.row_values(2), None);
        assert_eq!(grid.column_values(3), None);
    }

    #[test]
    fn test_statistics_skip_non_finite() {
        let grid = DeckGrid::assemble(&[[1.0, f64::NAN], [3.0, 8.0]]).unwrap();
        assert_eq!(grid.value_range(), Some((1.0, 8.0)));
        assert_eq!(grid.mean(), Some(4.0));

        let blank = DeckGrid::assemble(&[[f64::NAN]]).unwrap();
        assert_eq!(blank.value_range(), None);
        assert_eq!(blank.mean(), None);
    }

    #[test]
    fn test_fingerprint_tracks_values_and_shape() {
        let a = DeckGrid::assemble(&[[1.0, 2.0, 3.0, 4.0]]).unwrap();
        let b = DeckGrid::assemble(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let c = DeckGrid::assemble(&[[1.0, 2.0], [3.0, 4.5]]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(b.fingerprint(), c.fingerprint());
        assert_eq!(b.fingerprint(), b.clone().fingerprint());
    }

    #[test]
    fn test_bind_sets_deck_id() {
        let mut grid = DeckGrid::assemble(&[[1.0, 2.0]]).unwrap();
        grid.bind(DeckId(7));
        assert!(grid.cells().iter().all(|c| c.deck_id == Some(DeckId(7))));
    }
}
