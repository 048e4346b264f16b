use super::*;

/// A v1 file whose first "record" position holds `body` directly, so the
/// decoder can be pointed at raw dict bytes.
fn dict_decoder_input(body: &[u8]) -> Vec<u8> {
    let mut file = v1_preamble();
    file.extend_from_slice(body);
    file
}

fn v1_encode(tree: &ContentTree) -> Vec<u8> {
    let mut pool = StringPool::new();
    Encoder::new(FormatVersion::V1, &mut pool)
        .encode_content(tree)
        .unwrap()
}

// -------------------- Decoding --------------------

#[test]
fn read_app_content() {
    let file = dict_decoder_input(&content_bytes());
    let mut decoder = Decoder::new(&file).unwrap();
    assert_eq!(decoder.read_dict().unwrap(), test_content());
    assert_eq!(decoder.position(), file.len());
}

#[test]
fn empty_dict_consumes_one_byte() {
    let file = dict_decoder_input(&[TAG_END, 0xff, 0xff]);
    let mut decoder = Decoder::new(&file).unwrap();
    let tree = decoder.read_dict().unwrap();
    assert!(tree.is_empty());
    assert_eq!(decoder.position(), 9);
}

#[test]
fn read_tagged_value_dispatches_on_tag() {
    let mut body = Vec::new();
    body.extend_from_slice(&(-2i32).to_le_bytes());
    body.extend_from_slice(b"text\0");
    body.extend_from_slice(&u64::MAX.to_le_bytes());
    let file = dict_decoder_input(&body);
    let mut decoder = Decoder::new(&file).unwrap();

    assert_eq!(decoder.read_tagged_value(TAG_INT32).unwrap(), Value::Int32(-2));
    assert_eq!(decoder.read_tagged_value(TAG_STRING).unwrap(), Value::from("text"));
    assert_eq!(decoder.read_tagged_value(TAG_INT64).unwrap(), Value::Int64(u64::MAX));
}

#[test]
fn end_marker_is_not_a_value_tag() {
    let file = dict_decoder_input(&[0, 0, 0, 0]);
    let mut decoder = Decoder::new(&file).unwrap();
    let err = decoder.read_tagged_value(TAG_END).unwrap_err();
    assert!(matches!(err, AppinfoError::CorruptValue { tag: TAG_END, .. }));
}

#[test]
fn unknown_tag_is_corrupt_value() {
    let mut body = Vec::new();
    body.push(0x05);
    body.extend_from_slice(b"key\0");
    body.push(TAG_END);
    let file = dict_decoder_input(&body);
    let mut decoder = Decoder::new(&file).unwrap();
    let err = decoder.read_dict().unwrap_err();
    assert!(matches!(
        err,
        AppinfoError::CorruptValue {
            tag: 0x05,
            offset: 8
        }
    ));
}

#[test]
fn unterminated_string_is_truncated_input() {
    let mut body = Vec::new();
    body.push(TAG_STRING);
    body.extend_from_slice(b"name\0never ends");
    let file = dict_decoder_input(&body);
    let mut decoder = Decoder::new(&file).unwrap();
    assert!(matches!(
        decoder.read_dict().unwrap_err(),
        AppinfoError::TruncatedInput { .. }
    ));
}

#[test]
fn missing_end_marker_is_truncated_input() {
    let mut body = Vec::new();
    body.push(TAG_INT32);
    body.extend_from_slice(b"a\0");
    body.extend_from_slice(&1u32.to_le_bytes());
    let file = dict_decoder_input(&body);
    let mut decoder = Decoder::new(&file).unwrap();
    assert!(matches!(
        decoder.read_dict().unwrap_err(),
        AppinfoError::TruncatedInput { .. }
    ));
}

#[test]
fn duplicate_keys_last_wins() {
    let mut body = Vec::new();
    for v in [1u32, 2] {
        body.push(TAG_INT32);
        body.extend_from_slice(b"dup\0");
        body.extend_from_slice(&v.to_le_bytes());
    }
    body.push(TAG_END);
    let file = dict_decoder_input(&body);
    let tree = Decoder::new(&file).unwrap().read_dict().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get("dup"), Some(&Value::Int32(2)));
}

#[test]
fn absurd_nesting_is_rejected() {
    let mut body = Vec::new();
    for _ in 0..(MAX_DEPTH + 1) {
        body.push(TAG_DICT);
        body.extend_from_slice(b"d\0");
    }
    body.extend(std::iter::repeat(TAG_END).take(MAX_DEPTH + 2));
    let file = dict_decoder_input(&body);
    let mut decoder = Decoder::new(&file).unwrap();
    assert!(matches!(
        decoder.read_dict().unwrap_err(),
        AppinfoError::TooDeep { .. }
    ));
}

// -------------------- Encoding --------------------

#[test]
fn encode_app_content() {
    assert_eq!(v1_encode(&test_content()), content_bytes());
}

#[test]
fn encode_empty_tree_is_single_end_marker() {
    assert_eq!(v1_encode(&ContentTree::new()), vec![TAG_END]);
}

#[test]
fn latin1_string_reencodes_original_bytes() {
    let mut body = Vec::new();
    body.push(TAG_STRING);
    body.extend_from_slice(b"name\0");
    body.extend_from_slice(b"Pok\xe9mon \xa9\0");
    body.push(TAG_END);

    let file = dict_decoder_input(&body);
    let tree = Decoder::new(&file).unwrap().read_dict().unwrap();
    match tree.get("name") {
        Some(Value::Str(s)) => {
            assert!(s.is_latin1());
            assert_eq!(s.as_str(), "Pokémon ©");
        }
        other => panic!("expected latin-1 string, got {:?}", other),
    }
    assert_eq!(v1_encode(&tree), body);
}

#[test]
fn latin1_key_reencodes_original_bytes() {
    let mut body = Vec::new();
    body.push(TAG_INT32);
    body.extend_from_slice(b"cl\xe9\0");
    body.extend_from_slice(&9u32.to_le_bytes());
    body.push(TAG_END);

    let file = dict_decoder_input(&body);
    let tree = Decoder::new(&file).unwrap().read_dict().unwrap();
    assert_eq!(tree.get("clé"), Some(&Value::Int32(9)));
    assert_eq!(v1_encode(&tree), body);
}

#[test]
fn int64_and_negative_int32_keep_their_width() {
    let mut tree = ContentTree::new();
    tree.insert("owner", Value::Int64(76_561_197_960_265_728));
    tree.insert("neg", -5);

    let mut expected = vec![TAG_INT64];
    expected.extend_from_slice(b"owner\0");
    expected.extend_from_slice(&76_561_197_960_265_728u64.to_le_bytes());
    expected.push(TAG_INT32);
    expected.extend_from_slice(b"neg\0");
    expected.extend_from_slice(&(-5i32).to_le_bytes());
    expected.push(TAG_END);

    let encoded = v1_encode(&tree);
    assert_eq!(encoded, expected);

    let file = dict_decoder_input(&encoded);
    assert_eq!(Decoder::new(&file).unwrap().read_dict().unwrap(), tree);
}

#[test]
fn encode_preserves_key_order() {
    let mut tree = ContentTree::new();
    tree.insert("z", 1);
    tree.insert("a", 2);
    let encoded = v1_encode(&tree);
    let z = encoded.windows(2).position(|w| w == b"z\0").unwrap();
    let a = encoded.windows(2).position(|w| w == b"a\0").unwrap();
    assert!(z < a);
}
