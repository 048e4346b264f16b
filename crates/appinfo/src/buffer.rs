use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::decoder::{find_record, Decoder};
use crate::encoder::{derive_header, Encoder};
use crate::error::{AppinfoError, Result};
use crate::format::{FormatVersion, SENTINEL_LEN};
use crate::header::{HEADER_SIZE, SIZE_EXCLUDED};
use crate::pool::StringPool;
use crate::{AppRecord, Appinfo};

/// Where [`AppinfoBuffer::update`] put a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splice {
    /// An existing record at `at` spanning `old_len` bytes was replaced.
    Replaced {
        at: usize,
        old_len: usize,
        new_len: usize,
    },
    /// The app had no record; it was inserted just before the sentinel.
    Inserted { at: usize, len: usize },
}

/// The raw bytes of one appinfo file plus what is needed to edit records
/// in place.
///
/// Offsets are recomputed from the bytes on every update, never cached
/// across edits, since any splice can shift everything after it.
pub struct AppinfoBuffer {
    data: Vec<u8>,
    version: FormatVersion,
    pool: StringPool,
    /// Offset of the string table (v2 only).
    table_offset: Option<usize>,
}

impl AppinfoBuffer {
    /// Validates the preamble and, for v2, loads the string pool.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let (version, pool, records) = {
            let decoder = Decoder::new(&data)?;
            (decoder.version(), decoder.pool().clone(), decoder.records())
        };
        let table_offset = version.has_string_pool().then_some(records.end);
        Ok(Self {
            data,
            version,
            pool,
            table_offset,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(fs::read(path)?)
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Decodes every record in the buffer.
    pub fn decode_all(&self) -> Result<Appinfo> {
        crate::decode(&self.data)
    }

    /// Decodes only the given apps.
    pub fn decode_selected<I>(&self, appids: I) -> Result<Appinfo>
    where
        I: IntoIterator<Item = u32>,
    {
        crate::decode_selected(&self.data, appids)
    }

    /// Re-encodes `record` and splices it over its current span, or inserts
    /// it before the sentinel if the app has no record yet.
    ///
    /// The span is found by the exact bytes of `record.header` as last
    /// written, falling back to the `[end-of-dict, appid]` anchor. Its length
    /// comes from the old header's `size`. On success `record.header` holds
    /// the new derived fields.
    ///
    /// Nothing in the buffer changes if encoding fails.
    pub fn update(&mut self, record: &mut AppRecord) -> Result<Splice> {
        let mut pool = self.pool.clone();
        let content = Encoder::new(self.version, &mut pool).encode_content(&record.content)?;
        let header = derive_header(&record.header, &record.content, &content);

        let mut staged = Vec::with_capacity(HEADER_SIZE + content.len());
        staged.extend_from_slice(&header.to_bytes());
        staged.extend_from_slice(&content);

        let splice = match self.locate(record)? {
            Some(span) => {
                let at = span.start;
                let old_len = span.len();
                self.data.splice(span, staged.iter().copied());
                Splice::Replaced {
                    at,
                    old_len,
                    new_len: staged.len(),
                }
            }
            None => {
                let region = self.records_region();
                let at = region.end.saturating_sub(SENTINEL_LEN).max(region.start);
                self.data.splice(at..at, staged.iter().copied());
                Splice::Inserted {
                    at,
                    len: staged.len(),
                }
            }
        };

        self.pool = pool;
        if let Some(table) = self.table_offset {
            let delta = match splice {
                Splice::Replaced {
                    old_len, new_len, ..
                } => new_len as isize - old_len as isize,
                Splice::Inserted { len, .. } => len as isize,
            };
            self.rewrite_table((table as isize + delta) as usize)?;
        }

        record.header = header;
        debug!(appid = record.header.appid, ?splice, "spliced appinfo record");
        Ok(splice)
    }

    /// Like [`update`](AppinfoBuffer::update) but fails with
    /// [`AppinfoError::RecordNotFound`] instead of inserting.
    pub fn replace(&mut self, record: &mut AppRecord) -> Result<Splice> {
        if self.locate(record)?.is_none() {
            return Err(AppinfoError::RecordNotFound {
                appid: record.header.appid,
            });
        }
        self.update(record)
    }

    /// Records plus the 4-byte sentinel.
    fn records_region(&self) -> Range<usize> {
        self.version.preamble_len()..self.table_offset.unwrap_or(self.data.len())
    }

    fn locate(&self, record: &AppRecord) -> Result<Option<Range<usize>>> {
        let region = self.records_region();
        let header_bytes = record.header.to_bytes();

        let start = self.data[region.clone()]
            .windows(HEADER_SIZE)
            .position(|w| w == header_bytes)
            .map(|i| region.start + i)
            .or_else(|| find_record(&self.data, region.clone(), record.header.appid));

        let Some(start) = start else {
            return Ok(None);
        };

        // the span length is whatever the bytes on disk say
        let stored = LittleEndian::read_u32(&self.data[start + 4..start + 8]) as usize;
        let end = start + SIZE_EXCLUDED + stored;
        if end > region.end {
            return Err(AppinfoError::TruncatedInput {
                offset: start,
                needed: SIZE_EXCLUDED + stored,
                available: region.end - start,
            });
        }
        Ok(Some(start..end))
    }

    /// Truncates at the (shifted) string table and writes the current pool.
    fn rewrite_table(&mut self, table: usize) -> Result<()> {
        self.data.truncate(table);
        self.pool.write_table(&mut self.data)?;
        LittleEndian::write_i64(&mut self.data[8..16], table as i64);
        self.table_offset = Some(table);
        Ok(())
    }
}
