//! Line-oriented storage access used by the dispenser.
//!
//! The dispenser only needs to open a source by path, read it one line at a
//! time and ask whether more data is left. Closing is dropping the reader.

use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sequential line reader over an opened source
pub trait LineReader {
    /// Read the next line into `buf`, replacing its contents
    ///
    /// The line terminator (`\n`, optionally preceded by `\r`) is stripped.
    /// Bytes that are not valid UTF-8 become U+FFFD. Returns `Ok(false)` once
    /// the source is exhausted.
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool>;

    /// Whether at least one more byte can be read
    fn has_more(&mut self) -> io::Result<bool>;
}

/// Something that can open named sources for line reading
pub trait Storage {
    type Reader: LineReader;

    fn open(&self, path: &Path) -> io::Result<Self::Reader>;
}

/// [`LineReader`] over any buffered byte stream
pub struct BufLineReader<R> {
    inner: R,
    bytes: Vec<u8>,
}

impl<R: BufRead> BufLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes: Vec::new(),
        }
    }
}

impl<R: BufRead> LineReader for BufLineReader<R> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool> {
        buf.clear();
        self.bytes.clear();
        if self.inner.read_until(b'\n', &mut self.bytes)? == 0 {
            return Ok(false);
        }
        buf.push_str(&String::from_utf8_lossy(strip_line_ending(&self.bytes)));
        Ok(true)
    }

    fn has_more(&mut self) -> io::Result<bool> {
        Ok(!self.inner.fill_buf()?.is_empty())
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Plain files read through a `BufReader`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    type Reader = BufLineReader<BufReader<File>>;

    fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        let file = File::open(path)?;
        Ok(BufLineReader::new(BufReader::new(file)))
    }
}

/// Files mapped read-only into memory
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapStorage;

impl Storage for MmapStorage {
    type Reader = BufLineReader<Cursor<Mmap>>;

    fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only; callers must not truncate the file while it is open.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(BufLineReader::new(Cursor::new(mmap)))
    }
}

/// In-memory sources keyed by path, for deterministic playback
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: HashMap<PathBuf, Arc<[u8]>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) {
        self.files
            .insert(path.into(), Arc::from(contents.as_ref()));
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }
}

impl Storage for MemoryStorage {
    type Reader = BufLineReader<Cursor<Arc<[u8]>>>;

    fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        let data = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory source at {}", path.display()),
            )
        })?;
        Ok(BufLineReader::new(Cursor::new(data)))
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    type Reader = S::Reader;

    fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        (**self).open(path)
    }
}
