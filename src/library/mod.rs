//! Book catalog and its backing store.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.bookshelf/
//! ├── config.yaml        # optional, see `config`
//! └── library.txt        # 3 lines per book: title, author, year
//! ```

pub mod catalog;
pub mod reader;
pub mod store;

pub use catalog::{
    AddOutcome, Catalog, CatalogError, LoadEnd, LoadSummary, Snapshot, DEFAULT_CAPACITY,
};
pub use reader::{ReadError, RecordReader};
pub use store::{FileStore, MemoryStore, RecordStore};
