//! Domain types for the bookshelf catalog.

pub mod record;

pub use record::{Field, ParseError, Record, LINES_PER_RECORD};
