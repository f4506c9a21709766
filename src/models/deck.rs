use crate::error::ShapeError;

/// Rectangular layout of panel ids describing one deck.
///
/// Construction guarantees every row holds exactly `cols` ids and that the
/// layout is non-empty. Panel ids are resolved against a panel map only at
/// render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSpec {
    layout: Vec<Vec<String>>,
    cols: usize,
}

impl DeckSpec {
    /// Creates a deck with an explicitly declared column count.
    pub fn new(layout: Vec<Vec<String>>, cols: usize) -> Result<Self, ShapeError> {
        if layout.is_empty() || cols == 0 {
            return Err(ShapeError::Empty);
        }
        for (row, ids) in layout.iter().enumerate() {
            if ids.len() != cols {
                return Err(ShapeError::Ragged {
                    row,
                    expected: cols,
                    found: ids.len(),
                });
            }
        }
        Ok(Self { layout, cols })
    }

    /// Creates a deck taking the column count from the first row.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Result<Self, ShapeError>
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layout: Vec<Vec<String>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        let cols = layout.first().map_or(0, Vec::len);
        Self::new(layout, cols)
    }

    pub fn layout(&self) -> &[Vec<String>] {
        &self.layout
    }

    pub fn rows(&self) -> usize {
        self.layout.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Panel id at (row, col), if in range.
    pub fn panel_at(&self, row: usize, col: usize) -> Option<&str> {
        self.layout.get(row)?.get(col).map(String::as_str)
    }

    /// Iterates `(row, col, panel_id)` in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.layout.iter().enumerate().flat_map(|(r, ids)| {
            ids.iter()
                .enumerate()
                .map(move |(c, id)| (r, c, id.as_str()))
        })
    }
}
