//! Append-only history of aggregate fixes.

pub mod memory;
pub mod sqlite;

use crate::fix::AggregateFix;

pub use memory::MemoryFixStore;
pub use sqlite::SqliteFixStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("fix store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Ordered, durable record of aggregate fixes.
pub trait FixStore {
    /// Persists `fix`; it must be visible to the next [`FixStore::read_all`].
    fn append(&mut self, fix: &AggregateFix) -> Result<(), StoreError>;

    /// Every stored fix in insertion order.
    fn read_all(&self) -> Result<Vec<AggregateFix>, StoreError>;

    fn len(&self) -> Result<usize, StoreError> {
        self.read_all().map(|fixes| fixes.len())
    }
}
