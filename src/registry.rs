//! Bidirectional-by-construction mapping between AS numbers and dense vertex
//! indices.
//!
//! Indices are handed out in first-occurrence order starting at 0, so the
//! registry doubles as the vertex numbering of the [`Topology`](crate::Topology).
//! The text form is one `<asn> <index>` pair per line.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use tracing::warn;

use crate::{error::RegistryError, hash::ChainedTable, topology::Asn};

#[derive(Debug, Clone)]
pub struct AsRegistry {
    table: ChainedTable<Asn, usize>,
    indices: ChainedTable<usize, Asn>,
    next: usize,
}

impl AsRegistry {
    pub const DEFAULT_BUCKETS: usize = 3000;

    pub fn new() -> Self {
        Self::with_buckets(Self::DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> Self {
        AsRegistry {
            table: ChainedTable::with_buckets(buckets),
            indices: ChainedTable::with_buckets(buckets),
            next: 0,
        }
    }

    /// Returns the index of `asn`, allocating the next free one if needed.
    pub fn ensure(&mut self, asn: Asn) -> usize {
        if let Some(&index) = self.table.get(&asn) {
            return index;
        }
        // `next` is above every index in use, so neither insert can collide
        let index = self.next;
        let inserted = self.table.insert(asn, index);
        debug_assert!(inserted.is_ok());
        let inserted = self.indices.insert(index, asn);
        debug_assert!(inserted.is_ok());
        self.next += 1;
        index
    }

    /// Records an explicit association. Both the AS number and the index must
    /// be unused.
    pub fn insert(&mut self, asn: Asn, index: usize) -> Result<(), RegistryError> {
        if self.table.contains(&asn) {
            return Err(RegistryError::DuplicateKey { asn });
        }
        if let Some(&holder) = self.indices.get(&index) {
            return Err(RegistryError::IndexTaken { index, asn: holder });
        }
        let bound = index
            .checked_add(1)
            .ok_or(RegistryError::IndexOutOfRange { index })?;

        let inserted = self.table.insert(asn, index);
        debug_assert!(inserted.is_ok());
        let inserted = self.indices.insert(index, asn);
        debug_assert!(inserted.is_ok());
        self.next = self.next.max(bound);
        Ok(())
    }

    pub fn lookup(&self, asn: Asn) -> Option<usize> {
        self.table.get(&asn).copied()
    }

    /// Reverse lookup: the AS number registered under `index`.
    pub fn asn_at(&self, index: usize) -> Option<Asn> {
        self.indices.get(&index).copied()
    }

    pub fn remove(&mut self, asn: Asn) -> Result<usize, RegistryError> {
        let index = self
            .table
            .remove(&asn)
            .ok_or(RegistryError::NotFound { asn })?;
        self.indices.remove(&index);
        Ok(index)
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Asn, usize)> + '_ {
        self.table.iter().map(|(&asn, &index)| (asn, index))
    }

    /// One past the largest index in use. Equal to `count()` unless a loaded
    /// file left gaps in the numbering.
    pub fn index_bound(&self) -> usize {
        // insert keeps every index below usize::MAX
        self.iter().map(|(_, index)| index + 1).max().unwrap_or(0)
    }

    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), RegistryError> {
        for (asn, index) in self.iter() {
            writeln!(writer, "{} {}", asn, index).map_err(RegistryError::from_write)?;
        }
        writer.flush().map_err(RegistryError::from_write)
    }

    /// Reads `<asn> <index>` lines until EOF or the first malformed line.
    ///
    /// An index must stay below the next free index plus the number of entries
    /// in the input, so numbering stays dense. Entries
    /// read before a malformed line stay in the registry. Entries whose AS
    /// number or index is already registered are skipped.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<usize, RegistryError> {
        let mut entries = Vec::new();
        let mut malformed = None;
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(RegistryError::from_read)?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_entry(&line) {
                Some((asn, index)) => entries.push((number + 1, asn, index, line)),
                None => {
                    malformed = Some(RegistryError::MalformedInput {
                        line: number + 1,
                        content: line,
                    });
                    break;
                }
            }
        }

        let bound = self.next.saturating_add(entries.len());
        let mut loaded = 0;
        for (line, asn, index, content) in entries {
            if index >= bound {
                return Err(RegistryError::MalformedInput { line, content });
            }
            match self.insert(asn, index) {
                Ok(()) => loaded += 1,
                Err(RegistryError::DuplicateKey { asn }) => {
                    warn!(asn, line, "duplicate registry entry skipped")
                }
                Err(RegistryError::IndexTaken { index, asn: holder }) => {
                    warn!(asn, index, holder, line, "registry index already taken, entry skipped")
                }
                Err(e) => return Err(e),
            }
        }

        match malformed {
            Some(e) => Err(e),
            None => Ok(loaded),
        }
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let file = File::create(path).map_err(RegistryError::from_write)?;
        self.save(BufWriter::new(file))
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let file = File::open(path).map_err(RegistryError::from_read)?;
        self.load(BufReader::new(file))
    }
}

impl Default for AsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_entry(line: &str) -> Option<(Asn, usize)> {
    let mut fields = line.split_whitespace();
    let asn = fields.next()?.parse().ok()?;
    let index = fields.next()?.parse().ok()?;
    match fields.next() {
        Some(_) => None,
        None => Some((asn, index)),
    }
}
