use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::models::{Favorite, NewFavorite};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // Duplicate (user_id, recipe_id) pairs are allowed.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS favorites (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    recipe_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    image TEXT,
                    cook_time INTEGER,
                    servings INTEGER,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // Expects columns:
    // 0: id, 1: user_id, 2: recipe_id, 3: title, 4: image,
    // 5: cook_time, 6: servings, 7: created_at
    fn favorite_from_row(row: &rusqlite::Row) -> rusqlite::Result<Favorite> {
        Ok(Favorite {
            id: row.get(0)?,
            user_id: row.get(1)?,
            recipe_id: row.get(2)?,
            title: row.get(3)?,
            image: row.get(4)?,
            cook_time: row.get(5)?,
            servings: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    pub fn insert_favorite(&self, fav: &NewFavorite) -> Result<Favorite> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO favorites
                 (user_id, recipe_id, title, image, cook_time, servings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                fav.user_id,
                fav.recipe_id,
                fav.title,
                fav.image,
                fav.cook_time,
                fav.servings,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_favorite(id)
    }

    pub fn get_favorite(&self, id: i64) -> Result<Favorite> {
        self.conn
            .query_row(
                "SELECT id, user_id, recipe_id, title, image, cook_time, servings, created_at
                 FROM favorites WHERE id = ?1",
                params![id],
                Self::favorite_from_row,
            )
            .context("Favorite not found")
    }

    pub fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, recipe_id, title, image, cook_time, servings, created_at
             FROM favorites WHERE user_id = ?1 ORDER BY id",
        )?;
        let favorites = stmt
            .query_map(params![user_id], Self::favorite_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    /// Delete every row for the pair, returning how many went.
    pub fn delete_favorites(&self, user_id: &str, recipe_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND recipe_id = ?2",
            params![user_id, recipe_id],
        )?;
        Ok(rows)
    }

    pub fn count_favorites(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;
        Ok(count)
    }
}
