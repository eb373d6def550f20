//! Block and sector persistence: packed integer keys over SQLite or memory.
#![forbid(unsafe_code)]

mod error;
pub mod keys;
pub mod legacy;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use keys::{block_key, key_to_block, key_to_sector, sector_key};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::Path;

/// Keyed blob tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Blocks,
    SectorsMeta,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Blocks => "blocks",
            Table::SectorsMeta => "sectors_meta",
        }
    }
}

/// Backing storage for a map. Writes between `begin` and `commit` form one
/// transaction.
pub trait Store: Send {
    /// True when the store did not exist before it was opened.
    fn is_new(&self) -> bool;

    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Insert or replace.
    fn put(&mut self, table: Table, key: i64, blob: &[u8]) -> Result<(), StoreError>;
    fn get(&self, table: Table, key: i64) -> Result<Option<Vec<u8>>, StoreError>;
    fn list_keys(&self, table: Table) -> Result<Vec<i64>, StoreError>;

    fn put_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Directory holding legacy flat files, if the store lives on disk.
    fn legacy_dir(&self) -> Option<&Path> {
        None
    }
}
