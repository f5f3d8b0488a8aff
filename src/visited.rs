use crate::{error::VisitedError, hash::ChainedTable};

/// Membership set over vertex indices, used to keep a DFS branch simple.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    table: ChainedTable<usize, ()>,
}

impl VisitedSet {
    pub const DEFAULT_BUCKETS: usize = 40;

    pub fn new() -> Self {
        Self::with_buckets(Self::DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> Self {
        VisitedSet {
            table: ChainedTable::with_buckets(buckets),
        }
    }

    pub fn insert(&mut self, vertex: usize) -> Result<(), VisitedError> {
        self.table
            .insert(vertex, ())
            .map_err(|(vertex, _)| VisitedError::AlreadyPresent(vertex))
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.table.contains(&vertex)
    }

    pub fn remove(&mut self, vertex: usize) -> Result<(), VisitedError> {
        self.table
            .remove(&vertex)
            .ok_or(VisitedError::NotFound(vertex))
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}
