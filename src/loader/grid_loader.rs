use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::loader::table;
use crate::models::{DeckGrid, DeckId, ScreenDeck, ScreenStore};

/// Loads measured deck tables into a `ScreenStore`.
pub struct GridLoader<'a> {
    store: &'a mut ScreenStore,
}

/// Whether a load wrote to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Saved,
    Unchanged,
}

impl<'a> GridLoader<'a> {
    pub fn new(store: &'a mut ScreenStore) -> Self {
        Self { store }
    }

    /// Reads a table file, assembles its grid and saves it under the name pair.
    pub fn load_deck_from_file(
        &mut self,
        path: &Path,
        screen_name: &str,
        deck_name: &str,
    ) -> Result<ScreenDeck> {
        let rows = table::read_table(path)?;
        debug!("Read {} rows from {:?}", rows.len(), path);

        let grid = DeckGrid::assemble(&rows)
            .with_context(|| format!("Table {:?} is not rectangular", path))?;
        let (deck, _) = self.load_grid(grid, screen_name, deck_name)?;
        Ok(deck)
    }

    /// Saves a grid unless the stored grid for the name pair is identical.
    pub fn load_grid(
        &mut self,
        grid: DeckGrid,
        screen_name: &str,
        deck_name: &str,
    ) -> Result<(ScreenDeck, LoadOutcome)> {
        if self
            .store
            .is_grid_current(screen_name, deck_name, grid.fingerprint())?
        {
            if let Some(existing) = self.store.find_deck(screen_name, deck_name)? {
                info!("Deck {}/{} unchanged, skipping save", screen_name, deck_name);
                return Ok((existing, LoadOutcome::Unchanged));
            }
        }

        let mut deck = ScreenDeck::new(screen_name, deck_name, grid);
        self.store.save_deck(&mut deck)?;
        Ok((deck, LoadOutcome::Saved))
    }

    /// Returns a stored deck's grid as a (rows, cols) table.
    pub fn get_deck_data(&self, id: DeckId) -> Result<Vec<Vec<f64>>> {
        self.store
            .get_deck_data(id)?
            .with_context(|| format!("No deck with id {}", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;
    use tempfile::tempdir;

    const DECK_1: &str = "\
10.5,12.3,11.8,13.2,10.9
9.8,11.5,10.2,12.7,11.3
11.2,10.8,12.5,11.9,10.5
12.1,11.7,10.3,11.4,12.8
10.7,12.9,11.1,10.6,11.8
";

    #[test]
    fn test_load_5x5_and_extract() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deck1.csv");
        std::fs::write(&path, DECK_1).unwrap();

        let mut store = ScreenStore::open_in_memory().unwrap();
        let mut loader = GridLoader::new(&mut store);
        let deck = loader
            .load_deck_from_file(&path, "Screen_A", "Deck_1")
            .unwrap();

        assert_eq!(deck.grid().len(), 25);
        let id = deck.id().unwrap();
        let data = loader.get_deck_data(id).unwrap();
        assert_eq!(data.len(), 5);
        assert!(data.iter().all(|r| r.len() == 5));
        assert_eq!(data[0], vec![10.5, 12.3, 11.8, 13.2, 10.9]);
        assert_eq!(data[4][1], 12.9);
        assert_eq!(data, table::parse_table(DECK_1).unwrap());
    }

    #[test]
    fn test_ragged_table_saves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1,2,3\n4,5\n").unwrap();

        let mut store = ScreenStore::open_in_memory().unwrap();
        let err = GridLoader::new(&mut store)
            .load_deck_from_file(&path, "S", "D")
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ShapeError>(),
            Some(ShapeError::Ragged { row: 1, .. })
        ));
        assert_eq!(store.count_decks().unwrap(), 0);
    }

    #[test]
    fn test_reload_unchanged_is_skipped() {
        let mut store = ScreenStore::open_in_memory().unwrap();
        let mut loader = GridLoader::new(&mut store);

        let grid = DeckGrid::assemble(&[[1.0, 2.0]]).unwrap();
        let (first, outcome) = loader.load_grid(grid.clone(), "S", "D").unwrap();
        assert_eq!(outcome, LoadOutcome::Saved);

        let (second, outcome) = loader.load_grid(grid, "S", "D").unwrap();
        assert_eq!(outcome, LoadOutcome::Unchanged);
        assert_eq!(first.id(), second.id());

        let changed = DeckGrid::assemble(&[[1.0, 3.0]]).unwrap();
        let (_, outcome) = loader.load_grid(changed, "S", "D").unwrap();
        assert_eq!(outcome, LoadOutcome::Saved);
    }

    #[test]
    fn test_unknown_deck_id() {
        let mut store = ScreenStore::open_in_memory().unwrap();
        let loader = GridLoader::new(&mut store);
        assert!(loader.get_deck_data(DeckId(42)).is_err());
    }
}
