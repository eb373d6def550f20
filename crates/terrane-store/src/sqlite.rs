use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::{Store, StoreError, Table};

pub const DB_FILE: &str = "map.sqlite";

/// SQLite-backed store in `<dir>/map.sqlite`.
pub struct SqliteStore {
    conn: Connection,
    dir: Option<PathBuf>,
    is_new: bool,
    in_tx: bool,
}

impl SqliteStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE);
        let is_new = !path.exists();
        let conn = Connection::open(&path)?;
        let store = Self { conn, dir: Some(dir.to_path_buf()), is_new, in_tx: false };
        store.init_schema()?;
        log::info!(target: "store", "opened {} (new: {})", path.display(), is_new);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, dir: None, is_new: true, in_tx: false };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blocks (
                pos INTEGER PRIMARY KEY,
                data BLOB NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sectors_meta (
                pos INTEGER PRIMARY KEY,
                data BLOB NOT NULL
            );
            CREATE TABLE IF NOT EXISTS map_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn is_new(&self) -> bool {
        self.is_new
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN;")?;
            self.in_tx = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT;")?;
            self.in_tx = false;
        }
        Ok(())
    }

    fn put(&mut self, table: Table, key: i64, blob: &[u8]) -> Result<(), StoreError> {
        let sql = format!("INSERT OR REPLACE INTO {} (pos, data) VALUES (?1, ?2)", table.name());
        self.conn.prepare_cached(&sql)?.execute(params![key, blob])?;
        Ok(())
    }

    fn get(&self, table: Table, key: i64) -> Result<Option<Vec<u8>>, StoreError> {
        let sql = format!("SELECT data FROM {} WHERE pos = ?1", table.name());
        let blob = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(blob)
    }

    fn list_keys(&self, table: Table) -> Result<Vec<i64>, StoreError> {
        let sql = format!("SELECT pos FROM {}", table.name());
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn put_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO map_meta (key, value) VALUES (?1, ?2)")?
            .execute(params![key, value])?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .prepare_cached("SELECT value FROM map_meta WHERE key = ?1")?
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn legacy_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.in_tx {
            if let Err(e) = self.conn.execute_batch("COMMIT;") {
                log::warn!(target: "store", "commit on close failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces() {
        let mut s = SqliteStore::open_in_memory().unwrap();
        s.put(Table::Blocks, 5, b"one").unwrap();
        s.put(Table::Blocks, 5, b"two").unwrap();
        assert_eq!(s.get(Table::Blocks, 5).unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(s.list_keys(Table::Blocks).unwrap(), vec![5]);
        assert!(s.get(Table::SectorsMeta, 5).unwrap().is_none());
    }

    #[test]
    fn transaction_nests_once() {
        let mut s = SqliteStore::open_in_memory().unwrap();
        s.begin().unwrap();
        s.begin().unwrap();
        s.put(Table::Blocks, -1, &[1, 2, 3]).unwrap();
        s.commit().unwrap();
        s.commit().unwrap();
        assert_eq!(s.get(Table::Blocks, -1).unwrap(), Some(vec![1, 2, 3]));
    }
}
