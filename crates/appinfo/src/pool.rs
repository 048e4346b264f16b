use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::{AppinfoError, Result};

/// Append-only, deduplicated table of key strings (v2 files).
///
/// Index `n` is the `n`-th distinct string ever interned, so keys that
/// already exist keep their on-disk index across saves. Equality is on raw
/// bytes, not on decoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPool {
    strings: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, u32>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `key`, appending it if it is new.
    pub fn intern(&mut self, key: &[u8]) -> u32 {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.strings.len() as u32;
        self.strings.push(key.to_vec());
        self.index.insert(key.to_vec(), i);
        i
    }

    /// Reads the on-disk table starting at `offset` in `bytes`.
    ///
    /// A string that appears twice is rejected: keys are written back by
    /// interning, which could only ever reproduce the first index.
    pub fn read_table(bytes: &[u8], offset: usize) -> Result<Self> {
        let truncated = |at: usize, needed: usize| AppinfoError::TruncatedInput {
            offset: at,
            needed,
            available: bytes.len().saturating_sub(at),
        };

        let head = bytes.get(offset..offset + 4).ok_or_else(|| truncated(offset, 4))?;
        let count = LittleEndian::read_u32(head);

        let mut pool = Self::new();
        let mut pos = offset + 4;
        for _ in 0..count {
            let rest = bytes.get(pos..).unwrap_or_default();
            let len = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| truncated(pos, rest.len() + 1))?;
            let key = &rest[..len];
            if pool.index.contains_key(key) {
                return Err(AppinfoError::DuplicatePoolEntry {
                    index: pool.strings.len() as u32,
                });
            }
            pool.intern(key);
            pos += len + 1;
        }
        Ok(pool)
    }

    /// Looks up the string at `index`.
    pub fn resolve(&self, index: u32) -> Result<&[u8]> {
        self.strings
            .get(index as usize)
            .map(Vec::as_slice)
            .ok_or(AppinfoError::PoolIndexOutOfRange {
                index,
                len: self.strings.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.strings.iter().map(Vec::as_slice)
    }

    /// Writes the on-disk table: `count: u32` then each string NUL-terminated.
    pub fn write_table<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.strings.len() as u32)?;
        for s in &self.strings {
            w.write_all(s)?;
            w.write_u8(0)?;
        }
        Ok(())
    }

    /// Encoded size of [`write_table`](StringPool::write_table) output.
    #[must_use]
    pub fn table_len(&self) -> usize {
        4 + self.strings.iter().map(|s| s.len() + 1).sum::<usize>()
    }
}
