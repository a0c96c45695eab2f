use super::{Store, Table};
use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Process-local store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held in `table`.
    pub fn len(&self, table: Table) -> usize {
        self.tables.read().get(&table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    fn put(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.tables
            .write()
            .entry(table)
            .or_default()
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn insert_new(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        if rows.contains_key(key) {
            return Err(StoreError::Conflict {
                table,
                key: key.to_owned(),
            });
        }
        rows.insert(key.to_owned(), value);
        Ok(())
    }

    fn scan(&self, table: Table) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}
