use crate::fix::AggregateFix;
use crate::store::{FixStore, StoreError};

/// Volatile store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryFixStore {
    fixes: Vec<AggregateFix>,
}

impl MemoryFixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixes(fixes: Vec<AggregateFix>) -> Self {
        Self { fixes }
    }
}

impl FixStore for MemoryFixStore {
    fn append(&mut self, fix: &AggregateFix) -> Result<(), StoreError> {
        self.fixes.push(*fix);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AggregateFix>, StoreError> {
        Ok(self.fixes.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.fixes.len())
    }
}
