//! Durable key/value seam under the repository
//!
//! Every record lives in one [`Table`] keyed by a string. The services never
//! touch a store directly; they go through [`crate::repository::Repository`],
//! which encodes records with minicbor.
use crate::error::StoreError;
use std::fmt;

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Tenders,
    TenderVersions,
    Bids,
    BidVersions,
    Employees,
    Organizations,
    Responsibles,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Tenders,
        Table::TenderVersions,
        Table::Bids,
        Table::BidVersions,
        Table::Employees,
        Table::Organizations,
        Table::Responsibles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Tenders => "tender",
            Table::TenderVersions => "tender_version",
            Table::Bids => "bid",
            Table::BidVersions => "bid_version",
            Table::Employees => "employee",
            Table::Organizations => "organization",
            Table::Responsibles => "organization_responsible",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row storage shared by every worker. Writes to one key are last-write-wins;
/// `insert_new` is the only conditional write.
pub trait Store: Send + Sync {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert or overwrite.
    fn put(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Insert only if `key` is absent, failing with [`StoreError::Conflict`]
    /// otherwise. Append-only logs are written through this.
    fn insert_new(&self, table: Table, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Every value of the table, in key order.
    fn scan(&self, table: Table) -> Result<Vec<Vec<u8>>, StoreError>;

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
