use byteorder::{ByteOrder, LittleEndian};

use crate::error::{AppinfoError, Result};

/// Size of an encoded [`AppHeader`].
pub const HEADER_SIZE: usize = 68;

/// Bytes of the header not counted by `size` (`appid` + `size` itself).
pub const SIZE_EXCLUDED: usize = 8;

/// A 20-byte SHA-1 digest.
pub type Digest = [u8; 20];

/// Fixed-layout record header, little-endian:
///
/// ```text
/// appid(u32) size(u32) state(u32) last_update(u32) access_token(u64)
/// checksum_text([u8; 20]) change_number(u32) checksum_binary([u8; 20])
/// ```
///
/// `size`, `checksum_text` and `checksum_binary` are derived from the
/// record's content and are rewritten on every encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppHeader {
    pub appid: u32,
    pub size: u32,
    pub state: u32,
    pub last_update: u32,
    pub access_token: u64,
    pub checksum_text: Digest,
    pub change_number: u32,
    pub checksum_binary: Digest,
}

impl AppHeader {
    /// Decodes a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(AppinfoError::TruncatedInput {
                offset: 0,
                needed: HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let mut checksum_text = [0u8; 20];
        checksum_text.copy_from_slice(&bytes[24..44]);
        let mut checksum_binary = [0u8; 20];
        checksum_binary.copy_from_slice(&bytes[48..68]);

        Ok(Self {
            appid: LittleEndian::read_u32(&bytes[0..4]),
            size: LittleEndian::read_u32(&bytes[4..8]),
            state: LittleEndian::read_u32(&bytes[8..12]),
            last_update: LittleEndian::read_u32(&bytes[12..16]),
            access_token: LittleEndian::read_u64(&bytes[16..24]),
            checksum_text,
            change_number: LittleEndian::read_u32(&bytes[44..48]),
            checksum_binary,
        })
    }

    /// Encodes the header; the exact inverse of [`decode`](AppHeader::decode).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.appid);
        LittleEndian::write_u32(&mut out[4..8], self.size);
        LittleEndian::write_u32(&mut out[8..12], self.state);
        LittleEndian::write_u32(&mut out[12..16], self.last_update);
        LittleEndian::write_u64(&mut out[16..24], self.access_token);
        out[24..44].copy_from_slice(&self.checksum_text);
        LittleEndian::write_u32(&mut out[44..48], self.change_number);
        out[48..68].copy_from_slice(&self.checksum_binary);
        out
    }

    /// Total on-disk length of the record this header describes.
    #[must_use]
    pub fn record_len(&self) -> usize {
        self.size as usize + SIZE_EXCLUDED
    }
}
