//! Bounded, ordered book catalog backed by a [`RecordStore`].
//!
//! The in-memory sequence is the source of truth for listing and search.
//! The store acts as an append-only log: it is replayed once by [`Catalog::load`]
//! and receives one encoded record per successful [`Catalog::add`].

use std::io;

use thiserror::Error;
use tracing::{debug, warn};

use super::reader::{ReadError, RecordReader};
use super::store::RecordStore;
use crate::domain::{ParseError, Record};

/// Default capacity bound
pub const DEFAULT_CAPACITY: usize = 1000;

/// Errors returned by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Library is full ({capacity} books). Cannot add more books")]
    Full { capacity: usize },

    #[error("Index {index} out of range (catalog holds {count} books)")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Why a pass over the store stopped
#[derive(Debug)]
pub enum LoadEnd {
    /// Every complete record was read
    EndOfInput,

    /// The capacity bound was hit before the end of the store
    CapacityReached,

    /// A block failed to decode; it and everything after it were skipped
    Malformed { line: usize, error: ParseError },

    /// The store could not be opened or read; nothing is kept
    Unreadable(io::Error),
}

impl LoadEnd {
    /// True when the whole store was read without problems
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }
}

/// Result of replaying the store into memory
#[derive(Debug)]
pub struct LoadSummary {
    /// Number of records now held in memory
    pub loaded: usize,

    /// How the load ended
    pub end: LoadEnd,
}

/// Records read directly from the store, independent of memory
#[derive(Debug)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub end: LoadEnd,
}

/// Result of a successful add
#[derive(Debug)]
pub enum AddOutcome {
    /// Added in memory and appended to the store
    Persisted(usize),

    /// Added in memory, but the store append failed.
    ///
    /// The record will be missing after the next load.
    Unpersisted { index: usize, reason: io::Error },
}

impl AddOutcome {
    /// Index of the new record in the catalog
    pub fn index(&self) -> usize {
        match self {
            Self::Persisted(index) | Self::Unpersisted { index, .. } => *index,
        }
    }

    /// Check whether the record reached the store
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

/// The book catalog
pub struct Catalog<S> {
    store: S,
    capacity: usize,
    records: Vec<Record>,
}

impl<S: RecordStore> Catalog<S> {
    /// Create an empty catalog. Nothing is read until [`Catalog::load`].
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            records: Vec::new(),
        }
    }

    /// Create a catalog and load it from the store
    pub fn open(store: S, capacity: usize) -> (Self, LoadSummary) {
        let mut catalog = Self::new(store, capacity);
        let summary = catalog.load();
        (catalog, summary)
    }

    /// Replay the store into memory, replacing whatever was held before.
    ///
    /// Never fails: a malformed block ends the load early and an unreadable
    /// store loads nothing. The reason is reported in the summary.
    pub fn load(&mut self) -> LoadSummary {
        let Snapshot { records, end } = read_store(&self.store, self.capacity);
        self.records = records;

        match &end {
            LoadEnd::EndOfInput | LoadEnd::CapacityReached => {
                debug!(
                    store = %self.store.describe(),
                    loaded = self.records.len(),
                    "Loaded catalog"
                );
            }
            LoadEnd::Malformed { line, error } => {
                warn!(
                    store = %self.store.describe(),
                    loaded = self.records.len(),
                    line,
                    "Stopped loading at malformed record: {}",
                    error
                );
            }
            LoadEnd::Unreadable(e) => {
                warn!(store = %self.store.describe(), "Could not read catalog: {}", e);
            }
        }

        LoadSummary {
            loaded: self.records.len(),
            end,
        }
    }

    /// Add a book, in memory first and then to the store.
    ///
    /// Fails only when the catalog is full. A store write failure leaves the
    /// record in memory and is reported as [`AddOutcome::Unpersisted`].
    pub fn add(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        year_published: i32,
    ) -> Result<AddOutcome, CatalogError> {
        if self.is_full() {
            return Err(CatalogError::Full {
                capacity: self.capacity,
            });
        }

        let record = Record::new(title, author, year_published);
        let text = record.to_text();
        self.records.push(record);
        let index = self.records.len() - 1;

        match self.store.append(text.as_bytes()) {
            Ok(()) => {
                debug!(index, store = %self.store.describe(), "Appended record");
                Ok(AddOutcome::Persisted(index))
            }
            Err(reason) => {
                warn!(
                    index,
                    store = %self.store.describe(),
                    "Record kept in memory but not saved: {}",
                    reason
                );
                Ok(AddOutcome::Unpersisted { index, reason })
            }
        }
    }

    /// All records in insertion order
    pub fn list_all(&self) -> &[Record] {
        &self.records
    }

    /// Re-read the store from scratch without touching memory
    pub fn disk_snapshot(&self) -> Snapshot {
        read_store(&self.store, usize::MAX)
    }

    /// First record whose title matches `query`, ignoring ASCII case
    pub fn search(&self, query: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.matches_title(query, true))
    }

    /// Get a record by position
    pub fn get(&self, index: usize) -> Result<&Record, CatalogError> {
        self.records
            .get(index)
            .ok_or(CatalogError::IndexOutOfRange {
                index,
                count: self.records.len(),
            })
    }

    /// Get the number of records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<'a, S: RecordStore> IntoIterator for &'a Catalog<S> {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read up to `limit` records, stopping quietly at the first bad block
fn read_store<S: RecordStore + ?Sized>(store: &S, limit: usize) -> Snapshot {
    let source = match store.reader() {
        Ok(Some(source)) => source,
        Ok(None) => {
            return Snapshot {
                records: Vec::new(),
                end: LoadEnd::EndOfInput,
            }
        }
        Err(e) => {
            return Snapshot {
                records: Vec::new(),
                end: LoadEnd::Unreadable(e),
            }
        }
    };

    let mut records = Vec::new();
    let mut reader = RecordReader::new(source);

    let end = loop {
        if records.len() >= limit {
            break LoadEnd::CapacityReached;
        }

        match reader.next() {
            None => break LoadEnd::EndOfInput,
            Some(Ok(record)) => records.push(record),
            Some(Err(ReadError::Malformed { line, source })) => {
                break LoadEnd::Malformed {
                    line,
                    error: source,
                }
            }
            Some(Err(ReadError::Io(e))) => {
                records.clear();
                break LoadEnd::Unreadable(e);
            }
        }
    };

    Snapshot { records, end }
}
