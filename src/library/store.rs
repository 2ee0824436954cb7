//! Byte-level storage behind the catalog.
//!
//! The catalog never touches files directly. It reads and appends through a
//! [`RecordStore`], so the same logic runs against the real backing file or an
//! in-memory buffer.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A byte source/sink holding encoded records
pub trait RecordStore {
    /// Open a fresh reader over the whole store.
    ///
    /// Returns `Ok(None)` when nothing has been written yet.
    fn reader(&self) -> io::Result<Option<Box<dyn BufRead>>>;

    /// Append bytes at the end of the store.
    ///
    /// If the store is non-empty and its last byte is not `\n`, a newline is
    /// written first so the appended bytes start on a fresh line.
    fn append(&self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location, used in log messages
    fn describe(&self) -> String;
}

/// Flat text file store.
///
/// Every call opens the file and drops the handle before returning, so the
/// file is never held open between operations.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for FileStore {
    fn reader(&self) -> io::Result<Option<Box<dyn BufRead>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }

        file.write_all(bytes)?;
        file.flush()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    bytes: Vec<u8>,
    written: bool,
    fail_reads: bool,
    fail_writes: bool,
}

/// Shared in-memory store.
///
/// Clones share the same buffer, which lets two catalogs observe one store
/// the way two runs of the program observe one file.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store that has never been written to
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `contents`
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.borrow_mut();
            state.bytes = contents.into().into_bytes();
            state.written = true;
        }
        store
    }

    /// Current contents, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.state.borrow().bytes).into_owned()
    }

    /// Make subsequent reads fail with `PermissionDenied`
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Make subsequent appends fail with `PermissionDenied`
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl RecordStore for MemoryStore {
    fn reader(&self) -> io::Result<Option<Box<dyn BufRead>>> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory store reads disabled",
            ));
        }
        if !state.written {
            return Ok(None);
        }
        Ok(Some(Box::new(Cursor::new(state.bytes.clone()))))
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory store writes disabled",
            ));
        }
        if state.bytes.last().is_some_and(|&b| b != b'\n') {
            state.bytes.push(b'\n');
        }
        state.bytes.extend_from_slice(bytes);
        state.written = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_all(store: &dyn RecordStore) -> Option<String> {
        store.reader().unwrap().map(|mut reader| {
            let mut text = String::new();
            reader.read_to_string(&mut text).unwrap();
            text
        })
    }

    #[test]
    fn test_file_store_missing_file_reads_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("books.txt"));
        assert!(read_all(&store).is_none());
    }

    #[test]
    fn test_file_store_append_creates_and_extends() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("books.txt"));

        store.append(b"Dune\n").unwrap();
        store.append(b"Frank Herbert\n").unwrap();

        assert_eq!(read_all(&store).unwrap(), "Dune\nFrank Herbert\n");
    }

    #[test]
    fn test_file_store_append_into_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("missing").join("books.txt"));
        assert!(store.append(b"Dune\n").is_err());
    }

    #[test]
    fn test_file_store_append_after_unterminated_line() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("books.txt"));
        std::fs::write(store.path(), "Dune").unwrap();

        store.append(b"Emma\n").unwrap();

        assert_eq!(read_all(&store).unwrap(), "Dune\nEmma\n");
    }

    #[test]
    fn test_memory_store_append_after_unterminated_line() {
        let store = MemoryStore::with_contents("Dune");
        store.append(b"Emma\n").unwrap();
        store.append(b"Beloved\n").unwrap();

        assert_eq!(store.contents(), "Dune\nEmma\nBeloved\n");
    }

    #[test]
    fn test_memory_store_clones_share_buffer() {
        let store = MemoryStore::new();
        let other = store.clone();

        assert!(read_all(&store).is_none());
        other.append(b"Emma\n").unwrap();
        assert_eq!(read_all(&store).unwrap(), "Emma\n");
    }

    #[test]
    fn test_memory_store_failures() {
        let store = MemoryStore::with_contents("Emma\n");

        store.set_fail_writes(true);
        assert!(store.append(b"more\n").is_err());
        assert_eq!(store.contents(), "Emma\n");

        store.set_fail_reads(true);
        assert!(store.reader().is_err());
    }
}
