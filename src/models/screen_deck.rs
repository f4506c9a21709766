use crate::models::grid::{DeckGrid, DeckId};

/// A named deck on a named screen, owning its measured grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenDeck {
    id: Option<DeckId>,
    screen_name: String,
    deck_name: String,
    grid: DeckGrid,
}

impl ScreenDeck {
    /// Creates an unsaved deck.
    pub fn new(screen_name: impl Into<String>, deck_name: impl Into<String>, grid: DeckGrid) -> Self {
        Self {
            id: None,
            screen_name: screen_name.into(),
            deck_name: deck_name.into(),
            grid,
        }
    }

    pub fn id(&self) -> Option<DeckId> {
        self.id
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }

    pub fn grid(&self) -> &DeckGrid {
        &self.grid
    }

    pub fn into_grid(self) -> DeckGrid {
        self.grid
    }

    /// The grid as a (rows, cols) table.
    pub fn data(&self) -> Vec<Vec<f64>> {
        self.grid.extract()
    }

    /// Attaches a store id to the deck and all of its cells.
    pub(crate) fn assign_id(&mut self, id: DeckId) {
        self.id = Some(id);
        self.grid.bind(id);
    }
}

impl std::fmt::Display for ScreenDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (rows, cols) = self.grid.shape();
        match self.id {
            Some(id) => write!(
                f,
                "ScreenDeck(id={}, screen='{}', deck='{}', {}x{})",
                id, self.screen_name, self.deck_name, rows, cols
            ),
            None => write!(
                f,
                "ScreenDeck(screen='{}', deck='{}', {}x{})",
                self.screen_name, self.deck_name, rows, cols
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deck_is_unsaved() {
        let grid = DeckGrid::assemble(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let deck = ScreenDeck::new("Screen_A", "Deck_1", grid);
        assert_eq!(deck.id(), None);
        assert_eq!(deck.data(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(deck.to_string(), "ScreenDeck(screen='Screen_A', deck='Deck_1', 2x2)");
    }

    #[test]
    fn test_assign_id_reaches_cells() {
        let grid = DeckGrid::assemble(&[[1.0, 2.0]]).unwrap();
        let mut deck = ScreenDeck::new("S", "D", grid);
        deck.assign_id(DeckId(3));
        assert_eq!(deck.id(), Some(DeckId(3)));
        assert!(deck.grid().cells().iter().all(|c| c.deck_id == Some(DeckId(3))));
        assert!(deck.to_string().starts_with("ScreenDeck(id=3,"));
    }
}
