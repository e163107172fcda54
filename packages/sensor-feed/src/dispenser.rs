//! Streaming CSV dispenser
//!
//! Reads one comma-separated row per call and scatters it into caller-owned
//! destination buffers laid out channel-major (`index = channel * rows + cursor`).
//! The write cursor wraps after `rows` samples so the destination behaves as a
//! ring window over the most recent rows.

use serde::{Deserialize, Serialize};
use std::mem;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{FeedError, Result};
use crate::quantize::QuantParams;
use crate::storage::{FsStorage, LineReader, Storage};
use crate::types::DispenserConfig;

/// Field separator for header and data rows
pub const SEPARATOR: char = ',';

/// Which destinations a dispenser writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    None,
    Float,
    Quantized,
    Both,
}

impl OutputKind {
    pub fn writes_float(self) -> bool {
        matches!(self, Self::Float | Self::Both)
    }

    pub fn writes_quantized(self) -> bool {
        matches!(self, Self::Quantized | Self::Both)
    }

}

impl FromStr for OutputKind {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "float" => Ok(Self::Float),
            "quantized" | "quant" | "uint8" => Ok(Self::Quantized),
            "both" => Ok(Self::Both),
            _ => Err(FeedError::InvalidParameter(format!(
                "Unknown output kind '{}'",
                s
            ))),
        }
    }
}

/// Caller-owned destination buffers, borrowed for the dispenser's use
#[derive(Debug, Default)]
pub enum OutputBuffers<'a> {
    #[default]
    None,
    Float(&'a mut [f32]),
    Quantized(&'a mut [u8]),
    Both {
        float: &'a mut [f32],
        quantized: &'a mut [u8],
    },
}

impl<'a> OutputBuffers<'a> {
    /// Build from optional float and quantised destinations
    pub fn from_parts(float: Option<&'a mut [f32]>, quantized: Option<&'a mut [u8]>) -> Self {
        match (float, quantized) {
            (None, None) => Self::None,
            (Some(float), None) => Self::Float(float),
            (None, Some(quantized)) => Self::Quantized(quantized),
            (Some(float), Some(quantized)) => Self::Both { float, quantized },
        }
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            Self::None => OutputKind::None,
            Self::Float(_) => OutputKind::Float,
            Self::Quantized(_) => OutputKind::Quantized,
            Self::Both { .. } => OutputKind::Both,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn float(&self) -> Option<&[f32]> {
        match self {
            Self::Float(buf) | Self::Both { float: buf, .. } => Some(&**buf),
            _ => None,
        }
    }

    pub fn quantized(&self) -> Option<&[u8]> {
        match self {
            Self::Quantized(buf) | Self::Both { quantized: buf, .. } => Some(&**buf),
            _ => None,
        }
    }

    /// Split back into the optional float and quantised destinations
    pub fn into_parts(self) -> (Option<&'a mut [f32]>, Option<&'a mut [u8]>) {
        match self {
            Self::None => (None, None),
            Self::Float(float) => (Some(float), None),
            Self::Quantized(quantized) => (None, Some(quantized)),
            Self::Both { float, quantized } => (Some(float), Some(quantized)),
        }
    }

    fn check_len(&self, required: usize) -> Result<()> {
        if let Some(buf) = self.float() {
            if buf.len() < required {
                return Err(FeedError::BufferTooSmall {
                    kind: "float",
                    required,
                    actual: buf.len(),
                });
            }
        }
        if let Some(buf) = self.quantized() {
            if buf.len() < required {
                return Err(FeedError::BufferTooSmall {
                    kind: "quantized",
                    required,
                    actual: buf.len(),
                });
            }
        }
        Ok(())
    }
}

/// Streams rows of a CSV source into channel-major ring windows
pub struct InputDispenser<'a, S: Storage = FsStorage> {
    storage: S,
    path: PathBuf,
    columns: usize,
    rows: usize,
    quant: QuantParams,
    line_buffer: Box<[f32]>,
    line: String,
    output: OutputBuffers<'a>,
    row_cursor: usize,
    reader: Option<S::Reader>,
    header: Vec<String>,
    lines_read: usize,
}

impl<'a> InputDispenser<'a, FsStorage> {
    /// Create a dispenser reading `path` from the local filesystem
    pub fn new<P: AsRef<Path>>(path: P, columns: usize, rows: usize) -> Result<Self> {
        Self::with_storage(FsStorage, path, columns, rows)
    }
}

impl<'a, S: Storage> InputDispenser<'a, S> {
    /// Create a dispenser over an arbitrary storage backend
    ///
    /// # Arguments
    /// * `storage` - Backend used to open `path`
    /// * `path` - Source identifier, fixed for the dispenser's lifetime
    /// * `columns` - Fields per row, checked against the header in [`begin`](Self::begin)
    /// * `rows` - Samples held per channel in the destination window
    pub fn with_storage<P: AsRef<Path>>(
        storage: S,
        path: P,
        columns: usize,
        rows: usize,
    ) -> Result<Self> {
        if columns == 0 {
            return Err(FeedError::InvalidParameter(
                "columns must be at least 1".to_string(),
            ));
        }
        if rows == 0 {
            return Err(FeedError::InvalidParameter(
                "rows must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            storage,
            path: path.as_ref().to_path_buf(),
            columns,
            rows,
            quant: QuantParams::default(),
            line_buffer: vec![0.0; columns].into_boxed_slice(),
            line: String::new(),
            output: OutputBuffers::None,
            row_cursor: 0,
            reader: None,
            header: Vec::new(),
            lines_read: 0,
        })
    }

    /// Create a dispenser from a validated configuration
    pub fn from_config(storage: S, config: &DispenserConfig) -> Result<Self> {
        config.validate()?;
        let mut dispenser = Self::with_storage(storage, &config.path, config.columns, config.rows)?;
        dispenser.quant = config.quantisation;
        Ok(dispenser)
    }

    /// Open the source and validate the header's column count
    ///
    /// On success the source is positioned at the first data row and the
    /// write cursor is at 0. On failure the dispenser holds no open source.
    pub fn begin(&mut self) -> Result<()> {
        self.reader = None;
        self.header.clear();
        self.lines_read = 0;

        let mut reader = self.storage.open(&self.path).map_err(|source| {
            log::error!("Failed to open data source {}: {}", self.path.display(), source);
            FeedError::Open {
                path: self.path.clone(),
                source,
            }
        })?;

        let found = if reader.read_line(&mut self.line)? {
            count_columns(&self.line)
        } else {
            0
        };

        if found != self.columns {
            log::warn!(
                "Column count mismatch in header of {}: found {}, expected {}",
                self.path.display(),
                found,
                self.columns
            );
            return Err(FeedError::SchemaMismatch {
                expected: self.columns,
                found,
            });
        }

        self.header = self
            .line
            .split(SEPARATOR)
            .map(|label| label.trim().to_string())
            .collect();
        self.lines_read = 1;
        self.row_cursor = 0;
        self.reader = Some(reader);

        log::info!(
            "Opened {} ({} columns, window of {} rows)",
            self.path.display(),
            self.columns,
            self.rows
        );
        Ok(())
    }

    /// True if no source is open or the open source is exhausted
    ///
    /// A read error is logged and counts as the end.
    pub fn is_end(&mut self) -> bool {
        match self.reader.as_mut().map(|reader| reader.has_more()) {
            Some(Ok(more)) => !more,
            Some(Err(e)) => {
                log::warn!("Read error on {}: {}", self.path.display(), e);
                true
            }
            None => true,
        }
    }

    /// Read one row and write it at the current cursor of every destination
    ///
    /// The cursor only advances when the row was written. Once `rows` samples
    /// have been written it wraps to 0 and the oldest row is overwritten next.
    pub fn stream_next(&mut self) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(FeedError::EndOfData);
        };
        if !reader.has_more()? {
            return Err(FeedError::EndOfData);
        }
        if self.output.is_none() {
            log::warn!("No output buffer set for {}", self.path.display());
            return Err(FeedError::NoDestination);
        }
        if !reader.read_line(&mut self.line)? {
            return Err(FeedError::EndOfData);
        }
        self.lines_read += 1;

        if let Err(e) = parse_row(&self.line, &mut self.line_buffer, self.lines_read) {
            log::warn!("Failed to parse CSV line {}: {}", self.lines_read, e);
            return Err(e);
        }

        self.write_row();
        self.row_cursor = (self.row_cursor + 1) % self.rows;
        Ok(())
    }

    /// Reopen the source, skip its header and restart the window at 0
    ///
    /// Fails with [`FeedError::NotOpen`] if [`begin`](Self::begin) has not
    /// succeeded. If reopening fails the dispenser is left without a source.
    pub fn rewind(&mut self) -> Result<()> {
        if self.reader.take().is_none() {
            return Err(FeedError::NotOpen);
        }

        let mut reader = self.storage.open(&self.path).map_err(|source| FeedError::Open {
            path: self.path.clone(),
            source,
        })?;
        reader.read_line(&mut self.line)?;

        self.reader = Some(reader);
        self.lines_read = 1;
        self.row_cursor = 0;
        log::info!("Rewound {}", self.path.display());
        Ok(())
    }

    /// Replace the destination buffers and restart the window at 0
    ///
    /// Every present buffer must hold at least `columns * rows` elements.
    /// Returns the previously installed buffers.
    pub fn set_output_buffer(&mut self, output: OutputBuffers<'a>) -> Result<OutputBuffers<'a>> {
        output.check_len(self.window_len())?;
        self.row_cursor = 0;
        Ok(mem::replace(&mut self.output, output))
    }

    /// Detach the destination buffers, handing them back to the caller
    pub fn release_output(&mut self) -> OutputBuffers<'a> {
        self.row_cursor = 0;
        mem::take(&mut self.output)
    }

    /// Update quantisation parameters for subsequent rows
    pub fn set_quantisation(&mut self, scale: f32, zero_point: i32) -> Result<()> {
        self.quant = QuantParams::new(scale, zero_point)?;
        Ok(())
    }

    pub fn quantisation(&self) -> QuantParams {
        self.quant
    }

    pub fn output(&self) -> &OutputBuffers<'a> {
        &self.output
    }

    pub fn row_cursor(&self) -> usize {
        self.row_cursor
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of elements in one destination window
    pub fn window_len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header labels captured by the last successful [`begin`](Self::begin)
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lines consumed from the source, header included
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Values parsed from the most recent row
    pub fn last_row(&self) -> &[f32] {
        &self.line_buffer
    }

    fn write_row(&mut self) {
        let rows = self.rows;
        let cursor = self.row_cursor;
        let quant = self.quant;
        let values = &self.line_buffer;

        match &mut self.output {
            OutputBuffers::None => {}
            OutputBuffers::Float(float) => scatter_float(float, values, rows, cursor),
            OutputBuffers::Quantized(quantized) => {
                scatter_quantized(quantized, values, rows, cursor, quant)
            }
            OutputBuffers::Both { float, quantized } => {
                scatter_float(float, values, rows, cursor);
                scatter_quantized(quantized, values, rows, cursor, quant);
            }
        }
    }
}

fn scatter_float(dst: &mut [f32], values: &[f32], rows: usize, cursor: usize) {
    for (ch, &value) in values.iter().enumerate() {
        dst[ch * rows + cursor] = value;
    }
}

fn scatter_quantized(dst: &mut [u8], values: &[f32], rows: usize, cursor: usize, quant: QuantParams) {
    for (ch, &value) in values.iter().enumerate() {
        dst[ch * rows + cursor] = quant.quantize(value);
    }
}

/// Number of fields in a header line
pub fn count_columns(line: &str) -> usize {
    line.matches(SEPARATOR).count() + 1
}

/// Parse the first `out.len()` fields of `line` into `out`
///
/// Only rows with fewer fields are rejected. Each field is read like C
/// `atof`: the longest numeric prefix counts and a field without one
/// (empty, or text) is 0. Fields past `out.len()` are ignored.
pub fn parse_row(line: &str, out: &mut [f32], line_no: usize) -> Result<()> {
    let expected = out.len();
    let mut fields = line.split(SEPARATOR);

    for (idx, slot) in out.iter_mut().enumerate() {
        let Some(token) = fields.next() else {
            return Err(FeedError::MalformedRow {
                line: line_no,
                expected,
                found: idx,
                reason: format!("found {}", idx),
            });
        };
        *slot = parse_field(token);
    }

    let extra = fields.count();
    if extra > 0 {
        log::trace!("Line {}: ignoring {} extra fields", line_no, extra);
    }
    Ok(())
}

/// Numeric value of a single field, 0 when it has no numeric prefix
pub fn parse_field(token: &str) -> f32 {
    let token = token.trim();
    if let Ok(value) = token.parse::<f32>() {
        return value;
    }

    let end = token
        .find(|c: char| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .unwrap_or(token.len());
    let value = (1..=end)
        .rev()
        .find_map(|n| token[..n].parse::<f32>().ok())
        .unwrap_or(0.0);
    log::debug!("Field {:?} read as {}", token, value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BufLineReader, MemoryStorage};
    use std::io::{BufReader, Read};

    const CSV: &str = "ax,ay,az\n1.0,2.0,3.0\n4.0,5.0,6.0\n7.0,8.0,9.0\n";

    fn dispenser<'a>(contents: &str, columns: usize, rows: usize) -> InputDispenser<'a, MemoryStorage> {
        let storage = MemoryStorage::new().with_file("imu.csv", contents);
        InputDispenser::with_storage(storage, "imu.csv", columns, rows).unwrap()
    }

    #[test]
    fn test_zero_geometry_rejected() {
        let storage = MemoryStorage::new();
        assert!(InputDispenser::with_storage(storage.clone(), "x", 0, 4).is_err());
        assert!(InputDispenser::with_storage(storage, "x", 3, 0).is_err());
    }

    #[test]
    fn test_begin_missing_source() {
        let mut d = InputDispenser::with_storage(MemoryStorage::new(), "nope.csv", 3, 2).unwrap();
        assert!(matches!(d.begin(), Err(FeedError::Open { .. })));
        assert!(d.is_end());
    }

    #[test]
    fn test_begin_captures_header() {
        let mut d = dispenser(CSV, 3, 2);
        d.begin().unwrap();
        assert_eq!(d.header(), ["ax", "ay", "az"]);
        assert_eq!(d.lines_read(), 1);
        assert!(!d.is_end());
    }

    #[test]
    fn test_schema_mismatch_leaves_dispenser_unusable() {
        let mut buf = vec![0.0f32; 8];
        let mut d = dispenser(CSV, 4, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();

        match d.begin() {
            Err(FeedError::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
        assert!(d.is_end());
        assert!(matches!(d.stream_next(), Err(FeedError::EndOfData)));
        assert!(matches!(d.rewind(), Err(FeedError::NotOpen)));
    }

    #[test]
    fn test_empty_source_is_schema_mismatch() {
        let mut d = dispenser("", 1, 2);
        assert!(matches!(
            d.begin(),
            Err(FeedError::SchemaMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_channel_major_layout() {
        let mut buf = vec![0.0f32; 6];
        let mut d = dispenser(CSV, 3, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();
        d.stream_next().unwrap();
        assert_eq!(d.row_cursor(), 0);
        assert_eq!(
            d.output().float().unwrap(),
            &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
        );
    }

    #[test]
    fn test_ring_wraps_and_overwrites_oldest() {
        let mut buf = vec![0.0f32; 6];
        let mut d = dispenser(CSV, 3, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();

        d.stream_next().unwrap();
        assert_eq!(d.row_cursor(), 1);
        d.stream_next().unwrap();
        assert_eq!(d.row_cursor(), 0);
        d.stream_next().unwrap();
        assert_eq!(d.row_cursor(), 1);
        assert_eq!(
            d.output().float().unwrap(),
            &[7.0, 4.0, 8.0, 5.0, 9.0, 6.0]
        );
        assert!(d.is_end());
        assert!(matches!(d.stream_next(), Err(FeedError::EndOfData)));
    }

    #[test]
    fn test_quantized_and_float_together() {
        let csv = "a,b,c\n-1.0,0.26,200.0\n";
        let mut float = vec![0.0f32; 3];
        let mut quant = vec![0u8; 3];
        let mut d = dispenser(csv, 3, 1);
        d.set_quantisation(0.5, 10).unwrap();
        d.set_output_buffer(OutputBuffers::from_parts(Some(&mut float), Some(&mut quant)))
            .unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();

        assert_eq!(d.output().kind(), OutputKind::Both);
        assert_eq!(d.output().float().unwrap(), &[-1.0, 0.26, 200.0]);
        // -1/0.5 = -2 -> 8; 0.26/0.5 = 0.52 -> 1 -> 11; 400 + 10 clamps to 255
        assert_eq!(d.output().quantized().unwrap(), &[8, 11, 255]);
    }

    #[test]
    fn test_quantisation_change_applies_to_next_row_only() {
        let csv = "v\n10.0\n10.0\n";
        let mut quant = vec![0u8; 2];
        let mut d = dispenser(csv, 1, 2);
        d.set_output_buffer(OutputBuffers::Quantized(&mut quant)).unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();
        d.set_quantisation(2.0, 1).unwrap();
        d.stream_next().unwrap();
        assert_eq!(d.output().quantized().unwrap(), &[10, 6]);
    }

    #[test]
    fn test_invalid_quantisation_keeps_previous() {
        let mut d = dispenser(CSV, 3, 2);
        d.set_quantisation(0.25, 3).unwrap();
        assert!(d.set_quantisation(0.0, 0).is_err());
        assert_eq!(d.quantisation(), QuantParams { scale: 0.25, zero_point: 3 });
    }

    #[test]
    fn test_no_destination_does_not_advance_or_consume() {
        let mut buf = vec![0.0f32; 6];
        let mut d = dispenser(CSV, 3, 2);
        d.begin().unwrap();
        assert!(matches!(d.stream_next(), Err(FeedError::NoDestination)));
        assert_eq!(d.row_cursor(), 0);

        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.stream_next().unwrap();
        assert_eq!(d.last_row(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_short_row_is_malformed_and_cursor_stays() {
        let csv = "a,b,c\n1,2\n4,5,6\n";
        let mut buf = vec![0.0f32; 6];
        let mut d = dispenser(csv, 3, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();

        match d.stream_next() {
            Err(FeedError::MalformedRow { line, expected, found, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected malformed row, got {:?}", other),
        }
        assert_eq!(d.row_cursor(), 0);
        d.stream_next().unwrap();
        assert_eq!(d.output().float().unwrap(), &[4.0, 0.0, 5.0, 0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut out = [0.0f32; 2];
        parse_row("1.5, 2.5,3.5,junk", &mut out, 2).unwrap();
        assert_eq!(out, [1.5, 2.5]);
    }

    #[test]
    fn test_empty_and_non_numeric_fields_read_as_zero() {
        let mut out = [9.0f32; 3];
        parse_row("1,,3", &mut out, 2).unwrap();
        assert_eq!(out, [1.0, 0.0, 3.0]);
        parse_row("1,abc, 3 ", &mut out, 2).unwrap();
        assert_eq!(out, [1.0, 0.0, 3.0]);
        assert!(parse_row("", &mut out, 2).is_err());
    }

    #[test]
    fn test_parse_field_uses_numeric_prefix() {
        assert_eq!(parse_field("12.5"), 12.5);
        assert_eq!(parse_field("12.5V"), 12.5);
        assert_eq!(parse_field("-3e2x"), -300.0);
        assert_eq!(parse_field("1e"), 1.0);
        assert_eq!(parse_field(""), 0.0);
        assert_eq!(parse_field("n/a"), 0.0);
    }

    #[test]
    fn test_non_utf8_header_only_counts_separators() {
        let storage = MemoryStorage::new().with_file("t.csv", b"temp_\xb0C,hum\n21.5,40\n");
        let mut buf = vec![0.0f32; 2];
        let mut d = InputDispenser::with_storage(storage, "t.csv", 2, 1).unwrap();
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();
        assert_eq!(d.header(), &["temp_\u{FFFD}C".to_string(), "hum".to_string()]);
        d.stream_next().unwrap();
        assert_eq!(d.last_row(), &[21.5, 40.0]);
    }

    /// Serves a header line, then fails every read
    struct HeaderThenFail;

    impl Storage for HeaderThenFail {
        type Reader = BufLineReader<BufReader<FlakyRead>>;

        fn open(&self, _path: &Path) -> std::io::Result<Self::Reader> {
            Ok(BufLineReader::new(BufReader::new(FlakyRead { sent: false })))
        }
    }

    struct FlakyRead {
        sent: bool,
    }

    impl Read for FlakyRead {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::other("bus error"));
            }
            self.sent = true;
            buf[..2].copy_from_slice(b"a\n");
            Ok(2)
        }
    }

    #[test]
    fn test_read_error_is_not_end_of_data() {
        let mut buf = vec![0.0f32; 1];
        let mut d = InputDispenser::with_storage(HeaderThenFail, "dev", 1, 1).unwrap();
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();
        assert!(matches!(d.stream_next(), Err(FeedError::Io(_))));
        assert!(d.is_end());
    }

    #[test]
    fn test_row_with_empty_field_is_streamed() {
        let mut buf = vec![0.0f32; 3];
        let mut d = dispenser("a,b,c\n1,,3\n", 3, 1);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();
        assert_eq!(d.last_row(), &[1.0, 0.0, 3.0]);
        assert_eq!(d.row_cursor(), 0);
    }

    #[test]
    fn test_rewind_reproduces_first_row() {
        let mut buf = vec![0.0f32; 6];
        let mut d = dispenser(CSV, 3, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut buf)).unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();
        let first = d.last_row().to_vec();
        d.stream_next().unwrap();
        d.stream_next().unwrap();

        d.rewind().unwrap();
        assert_eq!(d.row_cursor(), 0);
        assert_eq!(d.lines_read(), 1);
        d.stream_next().unwrap();
        assert_eq!(d.last_row(), first.as_slice());
        assert_eq!(d.row_cursor(), 1);
    }

    #[test]
    fn test_set_output_buffer_resets_cursor_and_returns_previous() {
        let mut first = vec![0.0f32; 6];
        let mut second = vec![0u8; 6];
        let mut d = dispenser(CSV, 3, 2);
        d.set_output_buffer(OutputBuffers::Float(&mut first)).unwrap();
        d.begin().unwrap();
        d.stream_next().unwrap();
        assert_eq!(d.row_cursor(), 1);

        let previous = d.set_output_buffer(OutputBuffers::Quantized(&mut second)).unwrap();
        assert_eq!(previous.kind(), OutputKind::Float);
        assert_eq!(d.row_cursor(), 0);
        d.stream_next().unwrap();
        assert_eq!(d.output().quantized().unwrap(), &[4, 0, 5, 0, 6, 0]);

        let released = d.release_output();
        assert_eq!(released.kind(), OutputKind::Quantized);
        assert!(d.output().is_none());
    }

    #[test]
    fn test_undersized_buffer_rejected() {
        let mut small = vec![0.0f32; 5];
        let mut d = dispenser(CSV, 3, 2);
        let err = d.set_output_buffer(OutputBuffers::Float(&mut small)).unwrap_err();
        assert!(matches!(
            err,
            FeedError::BufferTooSmall { required: 6, actual: 5, .. }
        ));
        assert!(d.output().is_none());
    }

    #[test]
    fn test_count_columns() {
        assert_eq!(count_columns("a"), 1);
        assert_eq!(count_columns("a,b,c"), 3);
        assert_eq!(count_columns(""), 1);
    }

    #[test]
    fn test_output_kind_from_str() {
        assert_eq!("float".parse::<OutputKind>().unwrap(), OutputKind::Float);
        assert_eq!("uint8".parse::<OutputKind>().unwrap(), OutputKind::Quantized);
        assert_eq!("both".parse::<OutputKind>().unwrap(), OutputKind::Both);
        assert!(matches!(
            "int8".parse::<OutputKind>(),
            Err(FeedError::InvalidParameter(_))
        ));
        assert!(OutputKind::Both.writes_float());
        assert!(!OutputKind::Float.writes_quantized());
    }
}
