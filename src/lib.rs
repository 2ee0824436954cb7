//! bookshelf - Console book catalog backed by a flat text file
//!
//! Books are kept in memory in insertion order and appended to a plain
//! text file, three lines per book, so the catalog survives restarts.
//!
//! # Modules
//!
//! - `domain`: The `Record` type and its text encoding
//! - `library`: The `Catalog`, its store abstraction and the record reader
//! - `config`: Data file location, capacity and accepted years
//! - `cli`: Command-line interface and interactive menu
//!
//! # Usage
//!
//! ```bash
//! # Add a book
//! bookshelf add "1984" "George Orwell" 1949
//!
//! # List and search
//! bookshelf list
//! bookshelf search "nineteen eighty-four"
//!
//! # Interactive menu
//! bookshelf
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use domain::{ParseError, Record};
pub use library::{
    AddOutcome, Catalog, CatalogError, FileStore, LoadEnd, LoadSummary, MemoryStore, RecordStore,
};
