//! Scalar leaf values.

use std::fmt;

use bson_model_pack::{Binary, BsonValue, DateTime, Decimal128, ObjectId};

/// Declared type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    Binary,
    DateTime,
    ObjectId,
    Decimal128,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int",
            ScalarType::Int64 => "long",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Binary => "binary",
            ScalarType::DateTime => "date",
            ScalarType::ObjectId => "objectId",
            ScalarType::Decimal128 => "decimal",
        }
    }

    /// The zero value of the type.
    pub fn default_value(self) -> Scalar {
        match self {
            ScalarType::Bool => Scalar::Bool(false),
            ScalarType::Int32 => Scalar::Int32(0),
            ScalarType::Int64 => Scalar::Int64(0),
            ScalarType::Double => Scalar::Double(0.0),
            ScalarType::String => Scalar::String(String::new()),
            ScalarType::Binary => Scalar::Binary(Binary::default()),
            ScalarType::DateTime => Scalar::DateTime(DateTime::UNIX_EPOCH),
            ScalarType::ObjectId => Scalar::ObjectId(ObjectId::default()),
            ScalarType::Decimal128 => Scalar::Decimal128(Decimal128::ZERO),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A leaf value. Scalars carry no change state of their own; their
/// changes are recorded by the containing object or array.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Binary(Binary),
    DateTime(DateTime),
    ObjectId(ObjectId),
    Decimal128(Decimal128),
    /// A stored BSON value with no declared counterpart (timestamp, regex,
    /// min/max key, deprecated types). Only found under untyped shapes,
    /// kept as read so re-encoding reproduces it.
    Opaque(BsonValue),
}

impl Scalar {
    /// `None` for [`Scalar::Null`] and [`Scalar::Opaque`].
    pub fn scalar_type(&self) -> Option<ScalarType> {
        Some(match self {
            Scalar::Null | Scalar::Opaque(_) => return None,
            Scalar::Bool(_) => ScalarType::Bool,
            Scalar::Int32(_) => ScalarType::Int32,
            Scalar::Int64(_) => ScalarType::Int64,
            Scalar::Double(_) => ScalarType::Double,
            Scalar::String(_) => ScalarType::String,
            Scalar::Binary(_) => ScalarType::Binary,
            Scalar::DateTime(_) => ScalarType::DateTime,
            Scalar::ObjectId(_) => ScalarType::ObjectId,
            Scalar::Decimal128(_) => ScalarType::Decimal128,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Opaque(v) => v.type_name(),
            s => s.scalar_type().map_or("null", ScalarType::name),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Scalar::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Int32 values widen.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int32(i) => Some(i64::from(*i)),
            Scalar::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Scalar::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Scalar::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Scalar::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match self {
            Scalar::Decimal128(d) => Some(*d),
            _ => None,
        }
    }

    pub fn to_bson(&self) -> BsonValue {
        match self {
            Scalar::Null => BsonValue::Null,
            Scalar::Bool(b) => BsonValue::Boolean(*b),
            Scalar::Int32(i) => BsonValue::Int32(*i),
            Scalar::Int64(i) => BsonValue::Int64(*i),
            Scalar::Double(f) => BsonValue::Float(*f),
            Scalar::String(s) => BsonValue::Str(s.clone()),
            Scalar::Binary(b) => BsonValue::Binary(b.clone()),
            Scalar::DateTime(dt) => BsonValue::DateTime(*dt),
            Scalar::ObjectId(id) => BsonValue::ObjectId(*id),
            Scalar::Decimal128(d) => BsonValue::Decimal128(*d),
            Scalar::Opaque(v) => v.clone(),
        }
    }
}

/// Doubles compare by bit pattern, so `NaN == NaN` and `0.0 != -0.0`.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int32(a), Scalar::Int32(b)) => a == b,
            (Scalar::Int64(a), Scalar::Int64(b)) => a == b,
            (Scalar::Double(a), Scalar::Double(b)) => a.to_bits() == b.to_bits(),
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Binary(a), Scalar::Binary(b)) => a == b,
            (Scalar::DateTime(a), Scalar::DateTime(b)) => a == b,
            (Scalar::ObjectId(a), Scalar::ObjectId(b)) => a == b,
            (Scalar::Decimal128(a), Scalar::Decimal128(b)) => a == b,
            (Scalar::Opaque(a), Scalar::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int32(i) => write!(f, "{i}"),
            Scalar::Int64(i) => write!(f, "{i}"),
            Scalar::Double(d) => write!(f, "{d}"),
            Scalar::String(s) => write!(f, "{s:?}"),
            Scalar::Binary(b) => write!(f, "Binary({}, {} bytes)", b.subtype, b.bytes.len()),
            Scalar::DateTime(dt) => write!(f, "{dt}"),
            Scalar::ObjectId(id) => write!(f, "ObjectId({id})"),
            Scalar::Decimal128(d) => write!(f, "Decimal128({d})"),
            Scalar::Opaque(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f64 => Double,
    String => String,
    Binary => Binary,
    DateTime => DateTime,
    ObjectId => ObjectId,
    Decimal128 => Decimal128,
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_owned())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(bytes: Vec<u8>) -> Self {
        Scalar::Binary(Binary::generic(bytes))
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Scalar::Null, Into::into)
    }
}
