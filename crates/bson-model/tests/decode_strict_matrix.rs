mod common;

use bson_model::{
    path, BsonValue, CodecOptions, DecodeError, GenericValue, Model, ModelConfig, ModelError,
    RootModel, StandardCodec, UnknownFields,
};
use bson_model_pack::{encode_document, BsonError, Regex, Timestamp};
use common::{base_player_json, labeled_schema, Player, Wallet};

fn doc(fields: Vec<(&str, BsonValue)>) -> Vec<u8> {
    let fields: Vec<(String, BsonValue)> =
        fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
    encode_document(&fields).unwrap()
}

fn text(s: &str) -> BsonValue {
    BsonValue::Str(s.to_owned())
}

fn decode(bytes: &[u8], opts: CodecOptions) -> Result<Player, ModelError> {
    Player::decode_bson(bytes, &StandardCodec::new(opts))
}

fn decode_err(bytes: &[u8], opts: CodecOptions) -> DecodeError {
    match decode(bytes, opts) {
        Err(ModelError::Decode(err)) => err,
        Err(other) => panic!("expected a decode error, got {other:?}"),
        Ok(_) => panic!("expected decode to fail"),
    }
}

#[test]
fn scalar_type_mismatch_names_path_and_types() {
    let bytes = doc(vec![("_id", text("k1")), ("age", text("old"))]);
    assert_eq!(
        decode_err(&bytes, CodecOptions::default()),
        DecodeError::TypeMismatch {
            path: path!("age"),
            expected: "int".into(),
            found: "string",
        }
    );
}

#[test]
fn nested_type_mismatch_reports_full_path() {
    let bytes = doc(vec![
        ("_id", text("k1")),
        (
            "wallet",
            BsonValue::Document(vec![("coins".into(), BsonValue::Int32(3))]),
        ),
    ]);
    assert_eq!(
        decode_err(&bytes, CodecOptions::default()),
        DecodeError::TypeMismatch {
            path: path!("wallet", "coins"),
            expected: "long".into(),
            found: "int",
        }
    );
}

#[test]
fn array_element_mismatch_reports_index() {
    let bytes = doc(vec![
        ("_id", text("k1")),
        ("tags", BsonValue::Array(vec![text("a"), BsonValue::Boolean(true)])),
    ]);
    assert!(matches!(
        decode_err(&bytes, CodecOptions::default()),
        DecodeError::TypeMismatch { ref path, .. } if *path == path!("tags", 1usize)
    ));
}

#[test]
fn null_only_fits_nullable_fields() {
    let ok = doc(vec![("_id", text("k1")), ("nickname", BsonValue::Null)]);
    assert!(decode(&ok, CodecOptions::default()).is_ok());

    let bad = doc(vec![("_id", text("k1")), ("name", BsonValue::Null)]);
    assert_eq!(
        decode_err(&bad, CodecOptions::default()),
        DecodeError::TypeMismatch {
            path: path!("name"),
            expected: "string".into(),
            found: "null",
        }
    );
}

#[test]
fn missing_identifier_always_fails() {
    let bytes = doc(vec![("name", text("a"))]);
    assert_eq!(
        decode_err(&bytes, CodecOptions::default()),
        DecodeError::MissingField { path: path!("_id") }
    );
}

#[test]
fn missing_fields_default_unless_rejected() {
    let bytes = doc(vec![("_id", text("k1"))]);
    let p = decode(&bytes, CodecOptions::default()).unwrap();
    assert_eq!(p.age(), 0);
    assert!(!p.has_changes());

    assert_eq!(
        decode_err(&bytes, CodecOptions::strict()),
        DecodeError::MissingField { path: path!("name") }
    );
}

#[test]
fn unknown_fields_follow_configured_policy() {
    let bytes = doc(vec![
        ("_id", text("k1")),
        ("legacy", BsonValue::Int64(9)),
    ]);

    let kept = decode(&bytes, CodecOptions::default()).unwrap();
    assert!(kept.root().get(&path!("legacy")).is_ok());

    let cfg = ModelConfig::from_toml_str("[codec]\nunknown_fields = \"ignore\"\n").unwrap();
    assert_eq!(cfg.codec.unknown_fields, UnknownFields::Ignore);
    let dropped = decode(&bytes, cfg.codec).unwrap();
    assert!(dropped.root().get(&path!("legacy")).is_err());

    assert_eq!(
        decode_err(&bytes, CodecOptions::strict()),
        DecodeError::UnknownField { path: path!("legacy") }
    );
}

#[test]
fn retained_unknown_fields_reencode_identically() {
    let codec = StandardCodec::default();
    let mut p = Player::create();
    p.set_id("k1").unwrap();
    let mut fields = bson_model_pack::decode_document(&p.to_insert(&codec).unwrap()).unwrap();
    fields.push((
        "legacy".into(),
        BsonValue::Document(vec![("deep".into(), BsonValue::Float(0.5))]),
    ));
    let bytes = encode_document(&fields).unwrap();

    let back = Player::decode_bson(&bytes, &codec).unwrap();
    assert_eq!(back.to_insert(&codec).unwrap(), bytes);
}

#[test]
fn duplicate_keys_are_rejected() {
    let bytes = doc(vec![("_id", text("k1")), ("name", text("a")), ("name", text("b"))]);
    assert_eq!(
        decode_err(&bytes, CodecOptions::default()),
        DecodeError::DuplicateField { path: path!("name") }
    );
}

#[test]
fn non_canonical_map_keys_are_rejected() {
    for key in ["abc", "01", "+1", ""] {
        let bytes = doc(vec![
            ("_id", text("k1")),
            (
                "scores",
                BsonValue::Document(vec![(key.into(), BsonValue::Int32(1))]),
            ),
        ]);
        assert_eq!(
            decode_err(&bytes, CodecOptions::default()),
            DecodeError::InvalidMapKey {
                path: path!("scores"),
                key: key.into(),
            },
            "key {key:?}"
        );
    }
}

#[test]
fn truncated_and_garbage_bytes_fail() {
    let bytes = doc(vec![("_id", text("k1"))]);
    assert_eq!(
        decode_err(&bytes[..bytes.len() - 3], CodecOptions::default()),
        DecodeError::Bson(BsonError::UnexpectedEof)
    );
    assert!(matches!(
        decode(&[0xff; 4], CodecOptions::default()),
        Err(ModelError::Decode(DecodeError::Bson(_)))
    ));
}

#[test]
fn generic_int32_overflow_is_out_of_range() {
    let mut value = base_player_json();
    value["age"] = serde_json::json!(1_i64 << 40);
    let err = RootModel::from_generic(
        Player::schema(),
        &GenericValue::from(value),
        &StandardCodec::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ModelError::Decode(DecodeError::OutOfRange {
            path: path!("age"),
            value: (1_i64 << 40).to_string(),
            expected: "int",
        })
    );
}

#[test]
fn generic_object_id_must_be_hex() {
    let value = GenericValue::Object(vec![
        ("_id".into(), GenericValue::from("not-an-id")),
        ("owner".into(), GenericValue::from("a")),
    ]);
    let err = RootModel::from_generic(
        Wallet::schema(),
        &value,
        &StandardCodec::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Decode(DecodeError::Malformed { ref path, .. }) if *path == path!("_id")
    ));
}

#[test]
fn extreme_decimal_exponent_is_malformed() {
    let value = GenericValue::Object(vec![
        ("_id".into(), GenericValue::from("070707070707070707070707")),
        ("balance".into(), GenericValue::from("1.5E-9223372036854775808")),
    ]);
    let err = RootModel::from_generic(Wallet::schema(), &value, &StandardCodec::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Decode(DecodeError::Malformed { ref path, .. }) if *path == path!("balance")
    ));
}

#[test]
fn unaddressable_string_map_keys_are_rejected() {
    for key in ["a.b", "$x", ""] {
        let bytes = doc(vec![
            ("_id", text("k1")),
            (
                "labels",
                BsonValue::Document(vec![(key.into(), BsonValue::Int32(1))]),
            ),
        ]);
        let err = RootModel::decode_bson(labeled_schema(), &bytes, &StandardCodec::default())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Decode(DecodeError::InvalidMapKey {
                path: path!("labels"),
                key: key.into(),
            }),
            "key {key:?}"
        );
    }
}

#[test]
fn server_internal_values_in_unknown_fields_are_tolerated() {
    let ts = BsonValue::Timestamp(Timestamp {
        time: 1_700_000_000,
        increment: 3,
    });
    let codec = StandardCodec::default();
    let mut p = Player::create();
    p.set_id("k1").unwrap();
    let mut fields = bson_model_pack::decode_document(&p.to_insert(&codec).unwrap()).unwrap();
    fields.push(("ts".into(), ts.clone()));
    fields.push((
        "legacy".into(),
        BsonValue::Document(vec![
            (
                "re".into(),
                BsonValue::Regex(Regex {
                    pattern: "^a".into(),
                    options: "i".into(),
                }),
            ),
            ("lo".into(), BsonValue::MinKey),
            ("hi".into(), BsonValue::MaxKey),
        ]),
    ));
    let bytes = encode_document(&fields).unwrap();

    let kept = decode(&bytes, CodecOptions::default()).unwrap();
    assert_eq!(kept.to_insert(&codec).unwrap(), bytes);
    assert_eq!(kept.root().get(&path!("ts")).unwrap().type_name(), "timestamp");

    let cfg = ModelConfig::from_toml_str("[codec]\nunknown_fields = \"ignore\"\n").unwrap();
    let dropped = decode(&bytes, cfg.codec).unwrap();
    assert!(dropped.root().get(&path!("ts")).is_err());

    let typed = doc(vec![("_id", text("k1")), ("name", ts)]);
    assert_eq!(
        decode_err(&typed, CodecOptions::default()),
        DecodeError::TypeMismatch {
            path: path!("name"),
            expected: "string".into(),
            found: "timestamp",
        }
    );
}
