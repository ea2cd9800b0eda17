//! SQLite implementation of [`crate::persist::FlightStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    airport::{Airport, Favorite, FavoriteView, NewFavorite},
    core::matching::escape_like,
};

use super::{FlightStore, StoreResult};

const AIRPORT_COLUMNS: &str = "id, iata_code, name, passengers";

/// Airport and favorite tables in one SQLite database.
pub struct SqliteFlightStore {
    conn: Connection,
}

impl SqliteFlightStore {
    /// Opens or creates a database at `path`, creating tables if absent.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening flight database");
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        tracing::info!("opening in-memory flight database");
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Every favorite row in insertion order, including ones whose codes do
    /// not resolve to an airport.
    pub fn favorites(&self) -> StoreResult<Vec<Favorite>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, departure_code, destination_code FROM favorite ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], favorite_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_airports(&self, where_clause: &str, arg: &str) -> StoreResult<Vec<Airport>> {
        let sql = format!(
            "SELECT {AIRPORT_COLUMNS} FROM airport WHERE {where_clause} \
             ORDER BY passengers DESC, id ASC"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![arg], airport_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl FlightStore for SqliteFlightStore {
    fn search_airports(&self, substring: &str) -> StoreResult<Vec<Airport>> {
        self.query_airports(
            "name LIKE '%' || ?1 || '%' ESCAPE '\\' OR iata_code LIKE '%' || ?1 || '%' ESCAPE '\\'",
            &escape_like(substring),
        )
    }

    fn list_other_airports(&self, exclude_code: &str) -> StoreResult<Vec<Airport>> {
        self.query_airports("iata_code IS NOT ?1", exclude_code)
    }

    fn list_favorites(&self) -> StoreResult<Vec<FavoriteView>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT fav.id, fav.departure_code, fav.destination_code, \
                    dep.name AS departure_name, dest.name AS destination_name \
             FROM favorite AS fav \
             JOIN airport dep ON fav.departure_code = dep.iata_code \
             JOIN airport dest ON fav.destination_code = dest.iata_code \
             ORDER BY fav.id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FavoriteView {
                id: row.get(0)?,
                departure_code: row.get(1)?,
                destination_code: row.get(2)?,
                departure_name: row.get(3)?,
                destination_name: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn add_favorite(&mut self, favorite: NewFavorite) -> StoreResult<Option<Favorite>> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO favorite(departure_code, destination_code) VALUES (?1, ?2)",
            params![favorite.departure_code, favorite.destination_code],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        let id = self.conn.last_insert_rowid();
        Ok(Some(favorite.with_id(id)))
    }

    fn remove_favorite(&mut self, favorite: &Favorite) -> StoreResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM favorite WHERE id = ?1", params![favorite.id])?;
        Ok(removed > 0)
    }

    fn find_favorite(
        &self,
        departure_code: &str,
        destination_code: &str,
    ) -> StoreResult<Option<Favorite>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, departure_code, destination_code FROM favorite \
                 WHERE departure_code = ?1 AND destination_code = ?2",
                params![departure_code, destination_code],
                favorite_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn seed_airports(&mut self, airports: &[Airport]) -> StoreResult<usize> {
        if self.airport_count()? > 0 {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO airport(id, iata_code, name, passengers) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for airport in airports {
                stmt.execute(params![
                    airport.id,
                    airport.iata_code,
                    airport.name,
                    airport.passengers,
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(count = airports.len(), "seeded airport table");
        Ok(airports.len())
    }

    fn airport_count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM airport", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn airport_from_row(row: &Row<'_>) -> rusqlite::Result<Airport> {
    Ok(Airport {
        id: row.get(0)?,
        iata_code: row.get(1)?,
        name: row.get(2)?,
        passengers: row.get(3)?,
    })
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        departure_code: row.get(1)?,
        destination_code: row.get(2)?,
    })
}
