mod buffer_tests;
mod value_tests;

use crate::*;
use keyvalues::{ContentTree, Value, VdfString};

/// Decodes a hex string into bytes.
pub(crate) fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

pub(crate) fn digest(s: &str) -> Digest {
    let mut d = [0u8; 20];
    d.copy_from_slice(&hex(s));
    d
}

/// Header whose checksums match [`test_content`].
pub(crate) fn test_header() -> AppHeader {
    AppHeader {
        appid: 0x6969,
        size: 0x52,
        state: 0x1,
        last_update: 0x153,
        access_token: 0x23,
        checksum_text: digest("6c54cc44dd36c40f2027375f6d9902ca595256df"),
        change_number: 0x64,
        checksum_binary: digest("4f9e8a499a44cf1214307bb4efb9b5637b977894"),
    }
}

/// `{"appinfo": {"appid": 0x6969}}`
pub(crate) fn test_content() -> ContentTree {
    let mut inner = ContentTree::new();
    inner.insert("appid", 0x6969);
    let mut tree = ContentTree::new();
    tree.insert("appinfo", inner);
    tree
}

/// Hand-assembled v1 encoding of [`test_header`].
pub(crate) fn header_bytes() -> Vec<u8> {
    let h = test_header();
    let mut out = Vec::new();
    out.extend_from_slice(&0x6969u32.to_le_bytes());
    out.extend_from_slice(&0x52u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0x153u32.to_le_bytes());
    out.extend_from_slice(&0x23u64.to_le_bytes());
    out.extend_from_slice(&h.checksum_text);
    out.extend_from_slice(&0x64u32.to_le_bytes());
    out.extend_from_slice(&h.checksum_binary);
    out
}

/// Hand-assembled v1 encoding of [`test_content`].
pub(crate) fn content_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    out.push(TAG_DICT);
    out.extend_from_slice(b"appinfo\0");
    out.push(TAG_INT32);
    out.extend_from_slice(b"appid\0");
    out.extend_from_slice(&0x6969u32.to_le_bytes());
    out.push(TAG_END);
    out.push(TAG_END);
    out
}

pub(crate) fn v1_preamble() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC_V1.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out
}

/// Wraps raw record bytes into a complete v1 file.
pub(crate) fn v1_file(records: &[u8]) -> Vec<u8> {
    let mut out = v1_preamble();
    out.extend_from_slice(records);
    out.extend_from_slice(&LAST_APPID.to_le_bytes());
    out
}

/// A file containing only the test app, built without the encoder.
pub(crate) fn single_app_file() -> Vec<u8> {
    let mut record = header_bytes();
    record.extend_from_slice(&content_bytes());
    v1_file(&record)
}

/// A record shaped like a real Steam entry.
pub(crate) fn make_record(appid: u32, name: &str) -> AppRecord {
    let mut content = ContentTree::new();
    content.set_path(&["appinfo", "appid"], appid as i32);
    content.set_path(&["appinfo", "common", "name"], name);
    content.set_path(&["appinfo", "common", "type"], "Game");
    content.set_path(&["appinfo", "common", "steam_release_date"], 1_100_000_000);
    content.set_path(&["appinfo", "extended", "developer"], "Valve");
    content.set_path(&["appinfo", "config", "launch", "0", "executable"], "hl.exe");
    content.set_path(&["appinfo", "config", "launch", "0", "type"], "default");
    let header = AppHeader {
        appid,
        state: 2,
        last_update: 1_700_000_000 + appid,
        access_token: u64::from(appid) << 8,
        change_number: 20_000_000 + appid,
        ..AppHeader::default()
    };
    AppRecord::new(header, content)
}

/// Collection of apps 5, 7, 8 and 10, one with a Latin‑1 name and an
/// 8-byte integer.
pub(crate) fn sample_appinfo(version: FormatVersion) -> Appinfo {
    let mut appinfo = Appinfo::new(version);
    appinfo.insert(make_record(5, "Dedicated Server"));
    let mut seven = make_record(7, "Steam Client");
    seven
        .content
        .set_path(&["appinfo", "common", "name_localized"], VdfString::decode(b"Cliente \xe9t\xe9"));
    seven
        .content
        .set_path(&["appinfo", "extended", "owner"], Value::Int64(76_561_197_960_265_728));
    appinfo.insert(seven);
    appinfo.insert(make_record(8, "winui2"));
    appinfo.insert(make_record(10, "Counter-Strike"));
    appinfo
}

/// Encoded bytes of [`sample_appinfo`].
pub(crate) fn sample_file(version: FormatVersion) -> Vec<u8> {
    encode(&mut sample_appinfo(version)).unwrap()
}
