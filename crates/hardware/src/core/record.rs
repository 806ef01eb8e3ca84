//! Eviction records.
//!
//! An `EvictionRecord` is the immutable snapshot of a block taken when it
//! leaves a set. Records are collected per set, aggregated at the end of a
//! run and optionally dumped as a hint file that a later flexible run replays.
//!
//! # Binary layout
//!
//! Records are serialized little-endian in a fixed 96-byte layout with the
//! alignment padding of a naturally aligned C struct:
//!
//! | offset | field           | type        |
//! |--------|-----------------|-------------|
//! | 0      | `block_address` | `u64`       |
//! | 8      | `block_size`    | `u32`       |
//! | 12     | `bitmap`        | `[u32; 16]` |
//! | 76     | padding         | 4 bytes     |
//! | 80     | `ins_insert`    | `u64`       |
//! | 88     | `ins_evict`     | `u64`       |

use std::io::{self, Read, Write};

use super::block::CacheBlock;
use crate::common::EVICT_BITMAP_MAX_SIZE;

/// Serialized size of one record in bytes.
pub const RECORD_SIZE: usize = 96;

const SIZE_OFFSET: usize = 8;
const BITMAP_OFFSET: usize = 12;
const INSERT_OFFSET: usize = 80;
const EVICT_OFFSET: usize = 88;

/// Snapshot of a block at eviction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictionRecord {
    block_address: u64,
    block_size: u32,
    bitmap: [u32; EVICT_BITMAP_MAX_SIZE],
    ins_insert: u64,
    ins_evict: u64,
}

impl EvictionRecord {
    /// Captures `block` as evicted at instruction `ins_evict`.
    ///
    /// Blocks wider than [`EVICT_BITMAP_MAX_SIZE`] words keep only their
    /// leading counters.
    pub fn from_block(block: &CacheBlock, ins_evict: u64) -> Self {
        let size = (block.words() as usize).min(EVICT_BITMAP_MAX_SIZE);
        let mut bitmap = [0u32; EVICT_BITMAP_MAX_SIZE];
        bitmap[..size].copy_from_slice(&block.counters()[..size]);
        Self {
            block_address: block.start,
            block_size: size as u32,
            bitmap,
            ins_insert: block.ins_insert,
            ins_evict,
        }
    }

    /// Builds a record from raw parts. Counters past `counters.len()` are zero.
    pub fn new(block_address: u64, counters: &[u32], ins_insert: u64, ins_evict: u64) -> Self {
        let size = counters.len().min(EVICT_BITMAP_MAX_SIZE);
        let mut bitmap = [0u32; EVICT_BITMAP_MAX_SIZE];
        bitmap[..size].copy_from_slice(&counters[..size]);
        Self {
            block_address,
            block_size: size as u32,
            bitmap,
            ins_insert,
            ins_evict,
        }
    }

    pub fn block_address(&self) -> u64 {
        self.block_address
    }

    /// Size of the recorded block in words.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Counter of word `i`, or `None` past the block size.
    pub fn bitmap_value(&self, i: usize) -> Option<u32> {
        (i < self.block_size as usize).then(|| self.bitmap[i])
    }

    /// Counters of the recorded words.
    pub fn counters(&self) -> &[u32] {
        &self.bitmap[..self.block_size as usize]
    }

    pub fn ins_insert(&self) -> u64 {
        self.ins_insert
    }

    pub fn ins_evict(&self) -> u64 {
        self.ins_evict
    }

    /// Number of words accessed at least once.
    pub fn word_count(&self) -> u32 {
        self.counters().iter().filter(|&&c| c > 0).count() as u32
    }

    /// Maximal runs of accessed words as inclusive `(first, last)` word
    /// offsets, found from the rising and falling edges of the counters.
    ///
    /// ```
    /// use flexcache::core::record::EvictionRecord;
    ///
    /// let er = EvictionRecord::new(0x40, &[1, 2, 0, 0, 3, 0, 1, 1], 0, 10);
    /// assert_eq!(er.occupied_runs(), vec![(0, 1), (4, 4), (6, 7)]);
    /// ```
    pub fn occupied_runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut open: Option<usize> = None;
        for (i, &c) in self.counters().iter().enumerate() {
            match (open, c > 0) {
                (None, true) => open = Some(i),
                (Some(first), false) => {
                    runs.push((first, i - 1));
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(first) = open {
            runs.push((first, self.block_size as usize - 1));
        }
        runs
    }

    /// Copy of this record keeping only the counters inside `[first, last]`.
    pub fn isolate_run(&self, first: usize, last: usize) -> Self {
        let mut copy = *self;
        for (i, c) in copy.bitmap.iter_mut().enumerate() {
            if i < first || i > last {
                *c = 0;
            }
        }
        copy
    }

    /// Serializes the record into its fixed binary layout.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..SIZE_OFFSET].copy_from_slice(&self.block_address.to_le_bytes());
        buf[SIZE_OFFSET..BITMAP_OFFSET].copy_from_slice(&self.block_size.to_le_bytes());
        for (i, c) in self.bitmap.iter().enumerate() {
            let at = BITMAP_OFFSET + i * 4;
            buf[at..at + 4].copy_from_slice(&c.to_le_bytes());
        }
        buf[INSERT_OFFSET..EVICT_OFFSET].copy_from_slice(&self.ins_insert.to_le_bytes());
        buf[EVICT_OFFSET..].copy_from_slice(&self.ins_evict.to_le_bytes());
        buf
    }

    /// Deserializes a record. A size field larger than the bitmap is clamped
    /// and counters past the size are ignored.
    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let u64_at = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[at..at + 8]);
            u64::from_le_bytes(b)
        };
        let u32_at = |at: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&buf[at..at + 4]);
            u32::from_le_bytes(b)
        };

        let block_size = u32_at(SIZE_OFFSET).min(EVICT_BITMAP_MAX_SIZE as u32);
        let mut bitmap = [0u32; EVICT_BITMAP_MAX_SIZE];
        for (i, c) in bitmap.iter_mut().enumerate().take(block_size as usize) {
            *c = u32_at(BITMAP_OFFSET + i * 4);
        }
        Self {
            block_address: u64_at(0),
            block_size,
            bitmap,
            ins_insert: u64_at(INSERT_OFFSET),
            ins_evict: u64_at(EVICT_OFFSET),
        }
    }

    /// Writes the record to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Reads the next record from `r`.
    ///
    /// Returns `Ok(None)` at a clean end of stream and an `UnexpectedEof`
    /// error if the stream ends inside a record.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match r.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        match filled {
            0 => Ok(None),
            RECORD_SIZE => Ok(Some(Self::from_bytes(&buf))),
            n => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated eviction record: {} of {} bytes", n, RECORD_SIZE),
            )),
        }
    }

    /// Writes the record in the human-readable form of the `dump` tool.
    pub fn describe<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "Block Address: {:#x}", self.block_address)?;
        writeln!(w, "InsInsert: {}", self.ins_insert)?;
        writeln!(w, "InsEvict: {}", self.ins_evict)?;
        write!(w, "Bitmap:")?;
        for c in self.counters() {
            write!(w, " {}", c)?;
        }
        writeln!(w)
    }
}
