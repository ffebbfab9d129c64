//! [`GenericValue`]: the neutral JSON-like tree exchanged with JSON backends.

/// Neutral JSON-like value.
///
/// Objects keep their key order. Integers and floats are kept apart so a
/// schema-driven decoder can tell `1` from `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<GenericValue>),
    Object(Vec<(String, GenericValue)>),
}

impl GenericValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            GenericValue::Null => "null",
            GenericValue::Bool(_) => "bool",
            GenericValue::Int(_) => "integer",
            GenericValue::Float(_) => "float",
            GenericValue::Str(_) => "string",
            GenericValue::Array(_) => "array",
            GenericValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GenericValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GenericValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GenericValue::Int(i) => Some(*i as f64),
            GenericValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GenericValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[GenericValue]> {
        match self {
            GenericValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, GenericValue)]> {
        match self {
            GenericValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up an object member; the first occurrence wins.
    pub fn get(&self, key: &str) -> Option<&GenericValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl From<serde_json::Value> for GenericValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => GenericValue::Null,
            serde_json::Value::Bool(b) => GenericValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GenericValue::Int(i)
                } else {
                    // u64 above i64::MAX and all non-integers.
                    GenericValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => GenericValue::Str(s),
            serde_json::Value::Array(arr) => {
                GenericValue::Array(arr.into_iter().map(GenericValue::from).collect())
            }
            serde_json::Value::Object(obj) => GenericValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, GenericValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Non-finite floats have no JSON form and become `null`.
impl From<GenericValue> for serde_json::Value {
    fn from(v: GenericValue) -> Self {
        match v {
            GenericValue::Null => serde_json::Value::Null,
            GenericValue::Bool(b) => serde_json::Value::Bool(b),
            GenericValue::Int(i) => serde_json::Value::from(i),
            GenericValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            GenericValue::Str(s) => serde_json::Value::String(s),
            GenericValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            GenericValue::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for GenericValue {
    fn from(b: bool) -> Self {
        GenericValue::Bool(b)
    }
}

impl From<i32> for GenericValue {
    fn from(i: i32) -> Self {
        GenericValue::Int(i64::from(i))
    }
}

impl From<i64> for GenericValue {
    fn from(i: i64) -> Self {
        GenericValue::Int(i)
    }
}

impl From<f64> for GenericValue {
    fn from(f: f64) -> Self {
        GenericValue::Float(f)
    }
}

impl From<&str> for GenericValue {
    fn from(s: &str) -> Self {
        GenericValue::Str(s.to_owned())
    }
}

impl From<String> for GenericValue {
    fn from(s: String) -> Self {
        GenericValue::Str(s)
    }
}
