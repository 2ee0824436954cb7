//! Streaming decoder for the three-line record format.

use std::io::{self, BufRead};

use thiserror::Error;

use crate::domain::{ParseError, Record, LINES_PER_RECORD};

/// Failure while reading records from a store
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record at line {line}: {source}")]
    Malformed {
        /// 1-based line number where the block starts
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// Iterator over the records in a byte source.
///
/// Yields `None` at a clean end of input (no lines left). A block with fewer
/// than three lines or a bad year yields one `Err` and the iterator is then
/// exhausted. Bytes that are not valid UTF-8 are replaced with U+FFFD.
pub struct RecordReader<R> {
    source: R,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buf: Vec::new(),
            line_no: 0,
            done: false,
        }
    }

    /// Next line without its `\n` or `\r\n` terminator
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.source.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn next_block(&mut self) -> Option<Result<Record, ReadError>> {
        let start = self.line_no + 1;
        let mut block = Vec::with_capacity(LINES_PER_RECORD);

        while block.len() < LINES_PER_RECORD {
            match self.next_line() {
                Ok(Some(line)) => {
                    self.line_no += 1;
                    block.push(line);
                }
                Ok(None) => break,
                Err(e) => return Some(Err(ReadError::Io(e))),
            }
        }

        if block.is_empty() {
            return None;
        }

        Some(Record::decode(block.as_slice()).map_err(|source| ReadError::Malformed {
            line: start,
            source,
        }))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = self.next_block();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::domain::Field;

    fn reader(text: &str) -> RecordReader<Cursor<Vec<u8>>> {
        RecordReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_reads_complete_records_in_order() {
        let records: Vec<Record> = reader("Dune\nHerbert\n1965\nEmma\nAusten\n1815\n")
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            records,
            vec![
                Record::new("Dune", "Herbert", 1965),
                Record::new("Emma", "Austen", 1815),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(reader("").next().is_none());
    }

    #[test]
    fn test_missing_final_newline_is_fine() {
        let records: Vec<_> = reader("Dune\nHerbert\n1965").collect();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_ok());
    }

    #[test]
    fn test_crlf_line_endings() {
        let record = reader("Dune\r\nHerbert\r\n1965\r\n").next().unwrap().unwrap();
        assert_eq!(record, Record::new("Dune", "Herbert", 1965));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let bytes = b"Caf\xe9\nAuthor\n2000\nDune\nHerbert\n1965\n".to_vec();
        let records: Vec<Record> = RecordReader::new(Cursor::new(bytes))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Caf\u{FFFD}");
        assert_eq!(records[1], Record::new("Dune", "Herbert", 1965));
    }

    #[test]
    fn test_truncated_tail_stops_iteration() {
        let mut iter = reader("Dune\nHerbert\n1965\nEmma\nAusten\n");

        assert!(iter.next().unwrap().is_ok());
        match iter.next() {
            Some(Err(ReadError::Malformed { line, source })) => {
                assert_eq!(line, 4);
                assert!(matches!(
                    source,
                    ParseError::Truncated {
                        missing: Field::Year
                    }
                ));
            }
            other => panic!("Expected malformed block, got {:?}", other),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_bad_year_stops_iteration() {
        let mut iter = reader("Dune\nHerbert\nMCMLXV\nEmma\nAusten\n1815\n");

        assert!(matches!(iter.next(), Some(Err(ReadError::Malformed { line: 1, .. }))));
        assert!(iter.next().is_none());
    }
}
