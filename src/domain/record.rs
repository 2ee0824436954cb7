//! A single catalog entry and its line-oriented text encoding.
//!
//! Each record occupies exactly three lines in the backing store:
//!
//! ```text
//! <title>
//! <author>
//! <year>
//! ```
//!
//! No escaping is performed. A title or author containing a newline will
//! corrupt the store; callers are expected to pass single-line values.

use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of lines a record occupies in the store
pub const LINES_PER_RECORD: usize = 3;

/// Errors produced while decoding a record block
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Truncated record: missing {missing} line")]
    Truncated { missing: Field },

    #[error("Invalid year {value:?}: {source}")]
    InvalidYear {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Record fields, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Year,
}

impl Field {
    const ORDER: [Field; LINES_PER_RECORD] = [Field::Title, Field::Author, Field::Year];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Author => write!(f, "author"),
            Field::Year => write!(f, "year"),
        }
    }
}

/// One book in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,

    pub author: String,

    /// Range checks happen in the CLI before a record is built
    pub year_published: i32,
}

impl Record {
    /// Create a new record
    pub fn new(title: impl Into<String>, author: impl Into<String>, year_published: i32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year_published,
        }
    }

    /// Encode as title, author and decimal year lines
    pub fn encode(&self) -> [String; LINES_PER_RECORD] {
        [
            self.title.clone(),
            self.author.clone(),
            self.year_published.to_string(),
        ]
    }

    /// Encoded lines, each terminated with `\n`, ready to append to a store
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in self.encode() {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }

    /// Decode a record from its three lines.
    ///
    /// Extra lines beyond the third are ignored. Whitespace around the year
    /// is tolerated; the title and author are kept verbatim.
    pub fn decode<S: AsRef<str>>(lines: &[S]) -> Result<Self, ParseError> {
        if let Some(&missing) = Field::ORDER.get(lines.len()) {
            return Err(ParseError::Truncated { missing });
        }

        let year_line = lines[2].as_ref();
        let year_published =
            year_line
                .trim()
                .parse::<i32>()
                .map_err(|source| ParseError::InvalidYear {
                    value: year_line.to_string(),
                    source,
                })?;

        Ok(Self {
            title: lines[0].as_ref().to_string(),
            author: lines[1].as_ref().to_string(),
            year_published,
        })
    }

    /// Compare the title against a query.
    ///
    /// Case folding is ASCII-only: `"ÉTÉ"` does not match `"été"`.
    pub fn matches_title(&self, query: &str, case_insensitive: bool) -> bool {
        if case_insensitive {
            self.title.eq_ignore_ascii_case(query)
        } else {
            self.title == query
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    Title: {}", self.title)?;
        writeln!(f, "    Author: {}", self.author)?;
        write!(f, "    Year: {}", self.year_published)
    }
}
