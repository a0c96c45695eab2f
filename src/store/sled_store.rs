use super::{Store, Table};
use crate::error::StoreError;
use std::path::Path;

/// sled backed store, one tree per [`Table`].
#[derive(Debug, Clone)]
pub struct SledStore {
    instance: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::from_db(sled::open(path)?))
    }

    /// A database that is removed when the last handle is dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    pub fn from_db(instance: sled::Db) -> Self {
        Self { instance }
    }

    fn tree(&self, table: Table) -> Result<sled::Tree, StoreError> {
        Ok(self.instance.open_tree(table.name())?)
    }
}

impl Store for SledStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree(table)?.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.tree(table)?.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn insert_new(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let swapped =
            self.tree(table)?
                .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(value))?;

        swapped.map_err(|_| StoreError::Conflict {
            table,
            key: key.to_owned(),
        })
    }

    fn scan(&self, table: Table) -> Result<Vec<Vec<u8>>, StoreError> {
        self.tree(table)?
            .iter()
            .values()
            .map(|value| value.map(|v| v.to_vec()).map_err(StoreError::from))
            .collect()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.instance.flush()?;
        Ok(())
    }
}
