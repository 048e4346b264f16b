use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn buffer(version: FormatVersion) -> AppinfoBuffer {
    AppinfoBuffer::new(sample_file(version)).unwrap()
}

fn rename(record: &mut AppRecord, name: &str) {
    record
        .content
        .set_path(&["appinfo", "common", "name"], name);
}

// -------------------- Replace in place --------------------

#[test]
fn unchanged_record_leaves_bytes_identical() {
    for version in [FormatVersion::V1, FormatVersion::V2] {
        let mut buf = buffer(version);
        let original = buf.as_bytes().to_vec();
        let appinfo = buf.decode_all().unwrap();

        for appid in [5, 7, 10] {
            let mut record = appinfo.get(appid).unwrap().clone();
            let splice = buf.update(&mut record).unwrap();
            assert!(matches!(splice, Splice::Replaced { old_len, new_len, .. } if old_len == new_len));
        }
        assert_eq!(buf.as_bytes(), &original[..]);
    }
}

#[test]
fn updated_record_matches_full_encode() {
    for version in [FormatVersion::V1, FormatVersion::V2] {
        let mut buf = buffer(version);
        let mut appinfo = buf.decode_all().unwrap();

        let mut record = appinfo.get(8).unwrap().clone();
        rename(&mut record, "a considerably longer name than before");
        let splice = buf.update(&mut record).unwrap();
        match splice {
            Splice::Replaced { old_len, new_len, .. } => assert!(new_len > old_len),
            other => panic!("unexpected splice {:?}", other),
        }

        rename(appinfo.get_mut(8).unwrap(), "a considerably longer name than before");
        let expected = encode(&mut appinfo).unwrap();
        assert_eq!(buf.as_bytes(), &expected[..], "{:?}", version);
        assert_eq!(record.header, appinfo.get(8).unwrap().header);
    }
}

#[test]
fn shrinking_record_keeps_later_records_readable() {
    let mut buf = buffer(FormatVersion::V1);
    let mut record = buf.decode_all().unwrap().get(5).unwrap().clone();
    record.content.remove("appinfo");
    record.content.set_path(&["appinfo", "appid"], 5);
    buf.update(&mut record).unwrap();

    let appinfo = buf.decode_all().unwrap();
    assert_eq!(appinfo.apps.keys().copied().collect::<Vec<_>>(), vec![5, 7, 8, 10]);
    assert_eq!(appinfo.get(5).unwrap(), &record);
    assert_eq!(
        appinfo
            .get(10)
            .unwrap()
            .content
            .get_path(&["appinfo", "common", "name"])
            .and_then(Value::as_str),
        Some("Counter-Strike")
    );
}

#[test]
fn successive_updates_find_their_records() {
    let mut buf = buffer(FormatVersion::V2);
    let mut seven = buf.decode_all().unwrap().get(7).unwrap().clone();

    rename(&mut seven, "first");
    buf.update(&mut seven).unwrap();
    rename(&mut seven, "second, and longer");
    buf.update(&mut seven).unwrap();

    let appinfo = buf.decode_all().unwrap();
    assert_eq!(appinfo.len(), 4);
    assert_eq!(appinfo.get(7).unwrap(), &seven);
}

#[test]
fn stale_header_falls_back_to_anchor() {
    let mut buf = buffer(FormatVersion::V1);
    let original = buf.as_bytes().to_vec();
    let appinfo = buf.decode_all().unwrap();

    for appid in [5, 8] {
        let mut record = appinfo.get(appid).unwrap().clone();
        record.header.checksum_text = [0; 20];
        record.header.size = 1;
        assert!(matches!(buf.update(&mut record).unwrap(), Splice::Replaced { .. }));
        assert_eq!(record.header, appinfo.get(appid).unwrap().header);
    }
    assert_eq!(buf.as_bytes(), &original[..]);
}

// -------------------- Insert --------------------

#[test]
fn missing_record_is_inserted_before_sentinel() {
    for version in [FormatVersion::V1, FormatVersion::V2] {
        let mut buf = buffer(version);
        let mut record = make_record(99, "Brand New Game");
        let splice = buf.update(&mut record).unwrap();

        let appinfo = buf.decode_all().unwrap();
        assert_eq!(
            appinfo.apps.keys().copied().collect::<Vec<_>>(),
            vec![5, 7, 8, 10, 99]
        );
        assert_eq!(appinfo.get(99).unwrap(), &record);

        let Splice::Inserted { at, len } = splice else {
            panic!("expected an insert, got {:?}", splice);
        };
        assert_eq!(len, record.header.size as usize + 8);
        assert_eq!(&buf.as_bytes()[at + len..at + len + 4], &[0u8; 4]);
    }
}

#[test]
fn insert_into_empty_file() {
    let mut buf = AppinfoBuffer::new(v1_file(&[])).unwrap();
    let mut record = AppRecord::new(test_header(), test_content());
    assert_eq!(
        buf.update(&mut record).unwrap(),
        Splice::Inserted { at: 8, len: 90 }
    );
    assert_eq!(buf.as_bytes(), &single_app_file()[..]);
}

#[test]
fn replace_missing_record_fails_without_changes() {
    let mut buf = buffer(FormatVersion::V1);
    let original = buf.as_bytes().to_vec();
    let mut record = make_record(99, "nowhere");
    assert!(matches!(
        buf.replace(&mut record).unwrap_err(),
        AppinfoError::RecordNotFound { appid: 99 }
    ));
    assert_eq!(buf.as_bytes(), &original[..]);
}

// -------------------- v2 string table --------------------

#[test]
fn v2_update_with_new_key_rewrites_table() {
    let mut buf = buffer(FormatVersion::V2);
    let pool_before = buf.pool().len();
    let mut appinfo = buf.decode_all().unwrap();

    let mut record = appinfo.get(7).unwrap().clone();
    record
        .content
        .set_path(&["appinfo", "ufs", "quota"], Value::Int64(1 << 40));
    buf.update(&mut record).unwrap();
    assert_eq!(buf.pool().len(), pool_before + 2);

    appinfo
        .get_mut(7)
        .unwrap()
        .content
        .set_path(&["appinfo", "ufs", "quota"], Value::Int64(1 << 40));
    assert_eq!(buf.as_bytes(), &encode(&mut appinfo).unwrap()[..]);

    let reread = buf.decode_all().unwrap();
    assert_eq!(reread.pool.len(), pool_before + 2);
    assert_eq!(reread.get(7).unwrap(), &record);
}

#[test]
fn selective_decode_after_update() {
    let mut buf = buffer(FormatVersion::V2);
    let mut record = buf.decode_selected([8]).unwrap().get(8).unwrap().clone();
    rename(&mut record, "renamed");
    buf.update(&mut record).unwrap();

    let selected = buf.decode_selected([10, 8]).unwrap();
    assert_eq!(selected.get(8).unwrap(), &record);
    assert_eq!(selected.get(10), buf.decode_all().unwrap().get(10));
}

// -------------------- Files --------------------

#[test]
fn load_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&sample_file(FormatVersion::V1)).unwrap();
    file.flush().unwrap();

    let buf = AppinfoBuffer::load(file.path()).unwrap();
    assert_eq!(buf.version(), FormatVersion::V1);
    assert_eq!(buf.decode_all().unwrap().len(), 4);
    assert_eq!(buf.into_bytes(), sample_file(FormatVersion::V1));
}

#[test]
fn load_rejects_foreign_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"\"libraryfolders\"\n{\n}\n").unwrap();
    file.flush().unwrap();
    assert!(matches!(
        AppinfoBuffer::load(file.path()),
        Err(AppinfoError::IncompatibleFormat { .. })
    ));
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        AppinfoBuffer::load(dir.path().join("appinfo.vdf")),
        Err(AppinfoError::Io(_))
    ));
}
