//! Memory access trace reader.
//!
//! A trace is a text stream with one access per line:
//!
//! ```text
//! <ins_count> <op> <ip> <ea> <size> [ignored...]
//! ```
//!
//! `ins_count` and `size` are decimal, `ip` and `ea` hexadecimal with an
//! optional `0x` prefix, and `op` a single character (`R`/`W`). Blank lines
//! are skipped. Gzip-compressed traces are detected by their magic bytes and
//! decompressed on the fly.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::common::{Result, SimError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One memory access of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Dynamic instruction count of the access.
    pub ins_count: u64,
    /// Access direction, as written in the trace.
    pub op: char,
    /// Address of the accessing instruction.
    pub ip: u64,
    /// Effective (byte) address.
    pub ea: u64,
    /// Access size in bytes.
    pub size: u32,
}

impl TraceRecord {
    pub fn is_write(&self) -> bool {
        matches!(self.op, 'W' | 'w')
    }

    /// Parses one trace line. Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str, line_no: u64) -> Result<Option<Self>> {
        let mut fields = line.split_whitespace();
        let Some(ins) = fields.next() else {
            return Ok(None);
        };
        let err = |reason: String| SimError::Trace {
            line: line_no,
            reason,
        };

        let ins_count = ins
            .parse::<u64>()
            .map_err(|e| err(format!("instruction count '{}': {}", ins, e)))?;

        let op = fields
            .next()
            .ok_or_else(|| err("missing access type".into()))?;
        let mut chars = op.chars();
        let op = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(err(format!("access type '{}' is not one character", op))),
        };

        let ip = parse_hex(fields.next(), "instruction pointer").map_err(err)?;
        let ea = parse_hex(fields.next(), "effective address").map_err(err)?;

        let size = fields
            .next()
            .ok_or_else(|| err("missing access size".into()))?;
        let size = size
            .parse::<u32>()
            .map_err(|e| err(format!("access size '{}': {}", size, e)))?;

        Ok(Some(Self {
            ins_count,
            op,
            ip,
            ea,
            size,
        }))
    }
}

fn parse_hex(field: Option<&str>, what: &str) -> std::result::Result<u64, String> {
    let field = field.ok_or_else(|| format!("missing {}", what))?;
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).map_err(|e| format!("{} '{}': {}", what, field, e))
}

/// Iterator over the records of a trace.
pub struct TraceReader<R> {
    lines: Lines<R>,
    line_no: u64,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            match TraceRecord::parse(&line, self.line_no) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Boxed reader over a plain or gzip-compressed trace.
pub type DynTraceReader = TraceReader<Box<dyn BufRead + Send>>;

/// Wraps `reader`, decompressing it if it starts with the gzip magic.
pub fn trace_from_reader<R: Read + Send + 'static>(reader: R) -> Result<DynTraceReader> {
    let mut buffered = BufReader::new(reader);
    let compressed = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
    let inner: Box<dyn BufRead + Send> = if compressed {
        Box::new(BufReader::new(GzDecoder::new(buffered)))
    } else {
        Box::new(buffered)
    };
    Ok(TraceReader::new(inner))
}

/// Opens the trace at `path`.
pub fn open_trace(path: &Path) -> Result<DynTraceReader> {
    trace_from_reader(File::open(path)?)
}
