use std::collections::BTreeMap;

use crate::{Store, StoreError, Table};

/// Volatile store for tests and throwaway worlds.
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    blocks: BTreeMap<i64, Vec<u8>>,
    sectors: BTreeMap<i64, Vec<u8>>,
    meta: BTreeMap<String, String>,
    commits: u32,
    reopened: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same contents, flagged as pre-existing.
    pub fn reopen(mut self) -> Self {
        self.reopened = true;
        self
    }

    pub fn commits(&self) -> u32 {
        self.commits
    }

    fn table(&self, t: Table) -> &BTreeMap<i64, Vec<u8>> {
        match t {
            Table::Blocks => &self.blocks,
            Table::SectorsMeta => &self.sectors,
        }
    }
}

impl Store for MemoryStore {
    fn is_new(&self) -> bool {
        !self.reopened
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits += 1;
        Ok(())
    }

    fn put(&mut self, table: Table, key: i64, blob: &[u8]) -> Result<(), StoreError> {
        let t = match table {
            Table::Blocks => &mut self.blocks,
            Table::SectorsMeta => &mut self.sectors,
        };
        t.insert(key, blob.to_vec());
        Ok(())
    }

    fn get(&self, table: Table, key: i64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.table(table).get(&key).cloned())
    }

    fn list_keys(&self, table: Table) -> Result<Vec<i64>, StoreError> {
        Ok(self.table(table).keys().copied().collect())
    }

    fn put_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.meta.get(key).cloned())
    }
}
