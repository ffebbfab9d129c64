use bson_model_pack::{
    decode_document, encode_document, Binary, BsonDocument, BsonError, BsonValue, CodeWithScope,
    DateTime, DbPointer, Decimal128, ObjectId, Regex, Timestamp,
};
use proptest::prelude::*;

fn doc(fields: &[(&str, BsonValue)]) -> BsonDocument {
    fields
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn bson_encoder_wire_matrix() {
    // {"a": 1}
    assert_eq!(
        encode_document(&doc(&[("a", BsonValue::Int32(1))])).unwrap(),
        vec![0x0c, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]
    );
    // {"s": "x"}
    assert_eq!(
        encode_document(&doc(&[("s", BsonValue::Str("x".into()))])).unwrap(),
        vec![0x0e, 0, 0, 0, 0x02, b's', 0, 2, 0, 0, 0, b'x', 0, 0]
    );
    // {"t": true}
    assert_eq!(
        encode_document(&doc(&[("t", BsonValue::Boolean(true))])).unwrap(),
        vec![0x09, 0, 0, 0, 0x08, b't', 0, 1, 0]
    );
    // {"l": [1]} with array key "0"
    assert_eq!(
        encode_document(&doc(&[("l", BsonValue::Array(vec![BsonValue::Int32(1)]))])).unwrap(),
        vec![
            0x14, 0, 0, 0, 0x04, b'l', 0, 0x0c, 0, 0, 0, 0x10, b'0', 0, 1, 0, 0, 0, 0, 0
        ]
    );
}

#[test]
fn bson_type_fidelity_matrix() {
    let id = ObjectId::parse_str("0123456789abcdef01234567").unwrap();
    let original = doc(&[
        ("_id", BsonValue::ObjectId(id)),
        ("i32", BsonValue::Int32(-5)),
        ("i64", BsonValue::Int64(-5)),
        ("f", BsonValue::Float(-5.0)),
        ("bin", BsonValue::Binary(Binary::generic(vec![1, 2, 3]))),
        (
            "uuid",
            BsonValue::Binary(Binary {
                subtype: 0x04,
                bytes: vec![0xab; 16],
            }),
        ),
        ("when", BsonValue::DateTime(DateTime::from_millis(1_600_000_000_123))),
        ("dec", BsonValue::Decimal128("12345E-2".parse::<Decimal128>().unwrap())),
        ("nil", BsonValue::Null),
    ]);
    let bytes = encode_document(&original).unwrap();
    let decoded = decode_document(&bytes).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(encode_document(&decoded).unwrap(), bytes);
}

#[test]
fn bson_server_internal_types_matrix() {
    let id = ObjectId::from_bytes([9; 12]);
    let original = doc(&[
        ("ts", BsonValue::Timestamp(Timestamp { time: 1_700_000_000, increment: 7 })),
        (
            "re",
            BsonValue::Regex(Regex {
                pattern: "^a.*".into(),
                options: "im".into(),
            }),
        ),
        ("min", BsonValue::MinKey),
        ("max", BsonValue::MaxKey),
        ("undef", BsonValue::Undefined),
        ("js", BsonValue::JavaScriptCode("return 1".into())),
        ("sym", BsonValue::Symbol("s".into())),
        (
            "ptr",
            BsonValue::DbPointer(DbPointer {
                namespace: "db.c".into(),
                id,
            }),
        ),
        (
            "scoped",
            BsonValue::JavaScriptCodeWithScope(CodeWithScope {
                code: "x + y".into(),
                scope: vec![("x".into(), BsonValue::Int32(1))],
            }),
        ),
    ]);
    let bytes = encode_document(&original).unwrap();
    let decoded = decode_document(&bytes).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(encode_document(&decoded).unwrap(), bytes);
    assert_eq!(
        decoded.iter().map(|(_, v)| v.type_name()).collect::<Vec<_>>(),
        vec![
            "timestamp",
            "regex",
            "minKey",
            "maxKey",
            "undefined",
            "javascript",
            "symbol",
            "dbPointer",
            "javascriptWithScope"
        ]
    );
}

#[test]
fn bson_decoder_malformed_matrix() {
    let cases: Vec<(Vec<u8>, BsonError)> = vec![
        (vec![], BsonError::UnexpectedEof),
        (vec![5, 0, 0], BsonError::UnexpectedEof),
        (vec![6, 0, 0, 0, 0], BsonError::UnexpectedEof),
        (vec![0xff, 0xff, 0xff, 0xff, 0], BsonError::InvalidLength(-1)),
        // bool byte 2
        (vec![9, 0, 0, 0, 0x08, b't', 0, 2, 0], BsonError::InvalidBoolean(2)),
        // array key "1" where "0" is expected
        (
            vec![
                0x14, 0, 0, 0, 0x04, b'l', 0, 0x0c, 0, 0, 0, 0x10, b'1', 0, 1, 0, 0, 0, 0, 0,
            ],
            BsonError::InvalidArrayKey {
                expected: "0".into(),
                found: "1".into(),
            },
        ),
        // 0x14 is not an assigned element type
        (vec![8, 0, 0, 0, 0x14, b'r', 0, 0], BsonError::UnsupportedType(0x14)),
        // regex options without terminator
        (vec![9, 0, 0, 0, 0x0b, b'r', 0, b'a', 0], BsonError::UnexpectedEof),
        // string without terminator
        (
            vec![0x0e, 0, 0, 0, 0x02, b's', 0, 2, 0, 0, 0, b'x', b'y', 0],
            BsonError::InvalidLength(2),
        ),
        // invalid UTF-8 key
        (vec![8, 0, 0, 0, 0x0a, 0xff, 0, 0], BsonError::InvalidUtf8),
        (vec![5, 0, 0, 0, 0, 0], BsonError::TrailingBytes(1)),
    ];
    for (bytes, expected) in cases {
        assert_eq!(decode_document(&bytes), Err(expected), "bytes={bytes:?}");
    }
}

fn leaf_strategy() -> impl Strategy<Value = BsonValue> {
    prop_oneof![
        Just(BsonValue::Null),
        any::<bool>().prop_map(BsonValue::Boolean),
        any::<i32>().prop_map(BsonValue::Int32),
        any::<i64>().prop_map(BsonValue::Int64),
        (-1.0e9f64..1.0e9).prop_map(BsonValue::Float),
        "[a-zA-Z0-9 ]{0,12}".prop_map(BsonValue::Str),
        any::<[u8; 12]>().prop_map(|b| BsonValue::ObjectId(ObjectId::from_bytes(b))),
        any::<i64>().prop_map(|ms| BsonValue::DateTime(DateTime::from_millis(ms))),
        prop::collection::vec(any::<u8>(), 0..8)
            .prop_map(|b| BsonValue::Binary(Binary::generic(b))),
        (any::<u32>(), any::<u32>())
            .prop_map(|(time, increment)| BsonValue::Timestamp(Timestamp { time, increment })),
        ("[a-z.*]{0,6}", "[imsx]{0,2}")
            .prop_map(|(pattern, options)| BsonValue::Regex(Regex { pattern, options })),
        Just(BsonValue::MinKey),
        Just(BsonValue::MaxKey),
    ]
}

fn value_strategy() -> impl Strategy<Value = BsonValue> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(BsonValue::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(BsonValue::Document),
        ]
    })
}

proptest! {
    #[test]
    fn encode_decode_is_lossless(fields in prop::collection::vec(("[a-z_]{1,6}", value_strategy()), 0..6)) {
        let bytes = encode_document(&fields).unwrap();
        let decoded = decode_document(&bytes).unwrap();
        prop_assert_eq!(&decoded, &fields);
        prop_assert_eq!(encode_document(&decoded).unwrap(), bytes);
    }
}
