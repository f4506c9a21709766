//! SQLite-backed storage for screen decks and their grid cells.
//!
//! This module provides the `ScreenStore` struct which manages all database
//! operations for persisted decks:
//! - Deck identity, keyed uniquely by (screen name, deck name)
//! - The complete cell set of each deck's grid
//! - A grid fingerprint used to skip reloading unchanged sources

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use crate::config;
use crate::error::ShapeError;
use crate::models::{DeckGrid, DeckId, GridCell, ScreenDeck};

/// SQLite-backed storage for screen decks.
#[derive(Debug)]
pub struct ScreenStore {
    conn: Connection,
}

/// Lightweight listing entry for a stored deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSummary {
    pub id: DeckId,
    pub screen_name: String,
    pub deck_name: String,
    pub rows: usize,
    pub cols: usize,
    pub updated_at: i64,
}

/// Header row of a stored deck.
struct DeckRow {
    id: DeckId,
    screen_name: String,
    deck_name: String,
    rows: i64,
    cols: i64,
}

impl ScreenStore {
    /// Opens or creates the database at the default location.
    pub fn open_default() -> Result<Self> {
        let db_path = config::default_db_path()?;
        Self::open_or_recover(&db_path)
    }

    /// Opens the database, rebuilding it if SQLite reports the file as
    /// corrupt or not a database. Other failures are returned unchanged.
    pub fn open_or_recover(path: &Path) -> Result<Self> {
        match Self::open(path) {
            Err(err) if is_corruption(&err) => {
                warn!("Database at {:?} is unreadable: {:#}", path, err);
                Self::handle_corruption(path)
            }
            result => result,
        }
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;

        let store = Self::with_connection(conn)?;
        info!("Opened screen store at {:?}", path);
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to configure SQLite pragmas")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Creates the database schema if it doesn't exist.
    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS screen_decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                screen_name TEXT NOT NULL,
                deck_name TEXT NOT NULL,
                rows INTEGER NOT NULL,
                cols INTEGER NOT NULL,
                grid_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (screen_name, deck_name)
            );

            CREATE TABLE IF NOT EXISTS grid_cells (
                deck_id INTEGER NOT NULL,
                row_idx INTEGER NOT NULL,
                col_idx INTEGER NOT NULL,
                value REAL,
                PRIMARY KEY (deck_id, row_idx, col_idx),
                FOREIGN KEY (deck_id) REFERENCES screen_decks(id) ON DELETE CASCADE
            );
            ",
            )
            .context("Failed to create database tables")?;

        debug!("Database tables created/verified");
        Ok(())
    }

    // =========================================================================
    // Deck Operations
    // =========================================================================

    /// Inserts or replaces a deck and its full cell set.
    ///
    /// The (screen, deck) name pair identifies an existing row; its cells are
    /// replaced in one transaction. The assigned id is written back onto the
    /// deck and its cells.
    pub fn save_deck(&mut self, deck: &mut ScreenDeck) -> Result<DeckId> {
        let tx = self.conn.transaction()?;
        let id = Self::save_deck_in_tx(&tx, deck)?;
        tx.commit().context("Failed to commit deck")?;

        deck.assign_id(id);
        info!(
            "Saved deck {}/{} as id {} ({} cells)",
            deck.screen_name(),
            deck.deck_name(),
            id,
            deck.grid().len()
        );
        Ok(id)
    }

    fn save_deck_in_tx(tx: &Transaction, deck: &ScreenDeck) -> Result<DeckId> {
        let grid = deck.grid();
        let (rows, cols) = grid.shape();
        let now = Self::now();

        tx.execute(
            "
            INSERT INTO screen_decks (
                screen_name, deck_name, rows, cols, grid_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(screen_name, deck_name) DO UPDATE SET
                rows = excluded.rows,
                cols = excluded.cols,
                grid_hash = excluded.grid_hash,
                updated_at = excluded.updated_at
            ",
            params![
                deck.screen_name(),
                deck.deck_name(),
                rows as i64,
                cols as i64,
                hash_to_hex(grid.fingerprint()),
                now,
            ],
        )
        .context("Failed to upsert deck")?;

        let id: i64 = tx.query_row(
            "SELECT id FROM screen_decks WHERE screen_name = ?1 AND deck_name = ?2",
            params![deck.screen_name(), deck.deck_name()],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM grid_cells WHERE deck_id = ?1", params![id])?;

        let mut stmt = tx.prepare_cached(
            "INSERT INTO grid_cells (deck_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for cell in grid.cells() {
            // SQLite has no NaN; it is stored as NULL.
            let value = (!cell.value.is_nan()).then_some(cell.value);
            stmt.execute(params![id, cell.row as i64, cell.col as i64, value])?;
        }

        Ok(DeckId(id))
    }

    /// Loads a deck by id, rebuilding its grid with full shape checks.
    pub fn get_deck(&self, id: DeckId) -> Result<Option<ScreenDeck>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, screen_name, deck_name, rows, cols FROM screen_decks WHERE id = ?1",
                params![id.0],
                read_deck_row,
            )
            .optional()
            .context("Failed to query deck")?;

        header.map(|h| self.load_grid(h)).transpose()
    }

    /// Loads a deck by its (screen, deck) name pair.
    pub fn find_deck(&self, screen_name: &str, deck_name: &str) -> Result<Option<ScreenDeck>> {
        let header = self
            .conn
            .query_row(
                "
            SELECT id, screen_name, deck_name, rows, cols
            FROM screen_decks WHERE screen_name = ?1 AND deck_name = ?2
            ",
                params![screen_name, deck_name],
                read_deck_row,
            )
            .optional()
            .context("Failed to query deck")?;

        header.map(|h| self.load_grid(h)).transpose()
    }

    fn load_grid(&self, header: DeckRow) -> Result<ScreenDeck> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT row_idx, col_idx, value FROM grid_cells WHERE deck_id = ?1",
        )?;

        let cells = stmt
            .query_map(params![header.id.0], |row| {
                Ok(GridCell {
                    deck_id: Some(header.id),
                    row: to_index(row.get(0)?),
                    col: to_index(row.get(1)?),
                    value: row.get::<_, Option<f64>>(2)?.unwrap_or(f64::NAN),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let (rows, cols) = (to_index(header.rows), to_index(header.cols));
        let grid = check_cell_count(rows, cols, cells.len())
            .and_then(|()| DeckGrid::from_cells(rows, cols, cells))
            .with_context(|| format!("Stored grid for deck {} is inconsistent", header.id))?;

        let mut deck = ScreenDeck::new(header.screen_name, header.deck_name, grid);
        deck.assign_id(header.id);
        Ok(deck)
    }

    /// Returns a deck's grid as a (rows, cols) table, or `None` if unknown.
    pub fn get_deck_data(&self, id: DeckId) -> Result<Option<Vec<Vec<f64>>>> {
        Ok(self.get_deck(id)?.map(|deck| deck.data()))
    }

    /// Lists every stored deck ordered by screen then deck name.
    pub fn list_decks(&self) -> Result<Vec<DeckSummary>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, screen_name, deck_name, rows, cols, updated_at
            FROM screen_decks
            ORDER BY screen_name, deck_name
            ",
        )?;

        let decks = stmt
            .query_map([], |row| {
                Ok(DeckSummary {
                    id: DeckId(row.get(0)?),
                    screen_name: row.get(1)?,
                    deck_name: row.get(2)?,
                    rows: to_index(row.get(3)?),
                    cols: to_index(row.get(4)?),
                    updated_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(decks)
    }

    /// Deletes a deck and, through the cascade, its cells.
    pub fn delete_deck(&self, id: DeckId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM screen_decks WHERE id = ?1", params![id.0])?;
        if rows > 0 {
            info!("Deleted deck {}", id);
        }
        Ok(rows > 0)
    }

    /// Returns the total count of stored decks.
    pub fn count_decks(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM screen_decks", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the total count of stored grid cells across all decks.
    pub fn count_cells(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM grid_cells", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Checks whether the stored grid for a name pair has the given fingerprint.
    pub fn is_grid_current(&self, screen_name: &str, deck_name: &str, fingerprint: u64) -> Result<bool> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT grid_hash FROM screen_decks WHERE screen_name = ?1 AND deck_name = ?2",
                params![screen_name, deck_name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stored.as_deref() == Some(hash_to_hex(fingerprint).as_str()))
    }

    /// Returns the current Unix timestamp.
    pub fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Backs up an unreadable database file and creates a fresh one.
    pub fn handle_corruption(path: &Path) -> Result<Self> {
        warn!("Handling potential database corruption at {:?}", path);

        let backup_path = path.with_extension("sqlite.corrupted");
        if path.exists() {
            std::fs::rename(path, &backup_path).with_context(|| {
                format!("Failed to backup corrupted database to {:?}", backup_path)
            })?;
            warn!("Backed up corrupted database to {:?}", backup_path);
        }

        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            match std::fs::remove_file(&sidecar) {
                Ok(()) => debug!("Removed stale {:?}", sidecar),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to remove stale {:?}", sidecar))
                }
            }
        }

        Self::open(path)
    }
}

// =========================================================================
// Helper Functions
// =========================================================================

fn read_deck_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeckRow> {
    Ok(DeckRow {
        id: DeckId(row.get(0)?),
        screen_name: row.get(1)?,
        deck_name: row.get(2)?,
        rows: row.get(3)?,
        cols: row.get(4)?,
    })
}

fn is_corruption(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
        )
    })
}

/// Negative indices map to `usize::MAX`, which no range or count check accepts.
fn to_index(value: i64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Rejects a stored header whose shape disagrees with its cell rows before
/// anything is allocated from it.
fn check_cell_count(rows: usize, cols: usize, found: usize) -> Result<(), ShapeError> {
    if rows.checked_mul(cols) == Some(found) {
        Ok(())
    } else {
        Err(ShapeError::CellCount { rows, cols, found })
    }
}

fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}
