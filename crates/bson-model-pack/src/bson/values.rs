//! BSON-specific value types.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{TimeZone, Utc};
use rand::Rng;

use super::decimal::Decimal128;
use super::error::BsonError;

/// A BSON document: ordered key-value pairs.
pub type BsonDocument = Vec<(String, BsonValue)>;

/// BSON ObjectId (12 bytes: 4-byte big-endian timestamp, 5-byte per-process
/// random value, 3-byte big-endian counter).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl ObjectId {
    /// Generates a fresh identifier from the current time.
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00ff_ffff)))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses a 24-character hex string.
    pub fn parse_str(s: &str) -> Result<Self, BsonError> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| BsonError::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time embedded in the identifier.
    pub fn timestamp(&self) -> DateTime {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_millis(i64::from(seconds) * 1000)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = BsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// BSON UTC datetime, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateTime(i64);

impl DateTime {
    pub const UNIX_EPOCH: DateTime = DateTime(0);

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub const fn timestamp_millis(&self) -> i64 {
        self.0
    }

    /// `None` when the value lies outside chrono's representable range.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(dt: chrono::DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_chrono() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            None => write!(f, "DateTime({})", self.0),
        }
    }
}

/// BSON binary data (subtype + raw bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub const GENERIC: u8 = 0x00;

    pub fn generic(bytes: Vec<u8>) -> Self {
        Self {
            subtype: Self::GENERIC,
            bytes,
        }
    }
}

/// BSON regular expression: pattern and option flags, both C strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Regex {
    pub pattern: String,
    pub options: String,
}

/// BSON timestamp (MongoDB internal replication clock).
///
/// On the wire the increment comes first, then the seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

/// BSON DBPointer (deprecated).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

/// BSON JavaScript code with scope (deprecated).
#[derive(Debug, Clone, PartialEq)]
pub struct CodeWithScope {
    pub code: String,
    pub scope: BsonDocument,
}

/// A BSON value that can appear as a document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    /// BSON double (0x01)
    Float(f64),
    /// BSON UTF-8 string (0x02)
    Str(String),
    /// Embedded BSON document (0x03)
    Document(BsonDocument),
    /// BSON array (0x04)
    Array(Vec<BsonValue>),
    /// BSON binary data (0x05)
    Binary(Binary),
    /// BSON ObjectId (0x07)
    ObjectId(ObjectId),
    /// BSON boolean (0x08)
    Boolean(bool),
    /// BSON UTC datetime (0x09)
    DateTime(DateTime),
    /// BSON undefined (0x06, deprecated)
    Undefined,
    /// BSON null (0x0a)
    Null,
    /// BSON regular expression (0x0b)
    Regex(Regex),
    /// BSON DBPointer (0x0c, deprecated)
    DbPointer(DbPointer),
    /// BSON JavaScript code (0x0d)
    JavaScriptCode(String),
    /// BSON symbol (0x0e, deprecated)
    Symbol(String),
    /// BSON JavaScript code with scope (0x0f, deprecated)
    JavaScriptCodeWithScope(CodeWithScope),
    /// BSON int32 (0x10)
    Int32(i32),
    /// BSON timestamp (0x11)
    Timestamp(Timestamp),
    /// BSON int64 (0x12)
    Int64(i64),
    /// BSON Decimal128 (0x13)
    Decimal128(Decimal128),
    /// BSON MinKey (0xff)
    MinKey,
    /// BSON MaxKey (0x7f)
    MaxKey,
}

impl BsonValue {
    /// Element type tag.
    pub fn element_type(&self) -> u8 {
        match self {
            BsonValue::Float(_) => 0x01,
            BsonValue::Str(_) => 0x02,
            BsonValue::Document(_) => 0x03,
            BsonValue::Array(_) => 0x04,
            BsonValue::Binary(_) => 0x05,
            BsonValue::ObjectId(_) => 0x07,
            BsonValue::Boolean(_) => 0x08,
            BsonValue::DateTime(_) => 0x09,
            BsonValue::Undefined => 0x06,
            BsonValue::Null => 0x0a,
            BsonValue::Regex(_) => 0x0b,
            BsonValue::DbPointer(_) => 0x0c,
            BsonValue::JavaScriptCode(_) => 0x0d,
            BsonValue::Symbol(_) => 0x0e,
            BsonValue::JavaScriptCodeWithScope(_) => 0x0f,
            BsonValue::Int32(_) => 0x10,
            BsonValue::Timestamp(_) => 0x11,
            BsonValue::Int64(_) => 0x12,
            BsonValue::Decimal128(_) => 0x13,
            BsonValue::MinKey => 0xff,
            BsonValue::MaxKey => 0x7f,
        }
    }

    /// Human-readable type name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            BsonValue::Float(_) => "double",
            BsonValue::Str(_) => "string",
            BsonValue::Document(_) => "document",
            BsonValue::Array(_) => "array",
            BsonValue::Binary(_) => "binary",
            BsonValue::ObjectId(_) => "objectId",
            BsonValue::Boolean(_) => "bool",
            BsonValue::DateTime(_) => "date",
            BsonValue::Undefined => "undefined",
            BsonValue::Null => "null",
            BsonValue::Regex(_) => "regex",
            BsonValue::DbPointer(_) => "dbPointer",
            BsonValue::JavaScriptCode(_) => "javascript",
            BsonValue::Symbol(_) => "symbol",
            BsonValue::JavaScriptCodeWithScope(_) => "javascriptWithScope",
            BsonValue::Int32(_) => "int",
            BsonValue::Timestamp(_) => "timestamp",
            BsonValue::Int64(_) => "long",
            BsonValue::Decimal128(_) => "decimal",
            BsonValue::MinKey => "minKey",
            BsonValue::MaxKey => "maxKey",
        }
    }
}
