//! JSON text backends.
//!
//! A [`JsonBackend`] turns [`GenericValue`] trees into JSON text and back.
//! Callers pick a backend when they serialize; nothing else in the model
//! depends on a particular JSON library.

use thiserror::Error;

use crate::generic::GenericValue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error("JSON parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("JSON serialize error: {0}")]
    Serialize(String),
    #[error("non-finite float {0} has no JSON representation")]
    NonFiniteFloat(String),
}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            JsonError::Serialize(e.to_string())
        } else {
            JsonError::Parse {
                message: e.to_string(),
                line: e.line(),
                column: e.column(),
            }
        }
    }
}

/// Strategy for reading and writing JSON text.
pub trait JsonBackend {
    fn to_string(&self, value: &GenericValue) -> Result<String, JsonError>;

    fn from_str(&self, text: &str) -> Result<GenericValue, JsonError>;

    fn to_vec(&self, value: &GenericValue) -> Result<Vec<u8>, JsonError> {
        self.to_string(value).map(String::into_bytes)
    }

    fn from_slice(&self, bytes: &[u8]) -> Result<GenericValue, JsonError> {
        let text = std::str::from_utf8(bytes).map_err(|e| JsonError::Parse {
            message: e.to_string(),
            line: 0,
            column: e.valid_up_to(),
        })?;
        self.from_str(text)
    }
}

/// [`JsonBackend`] backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonBackend {
    pub pretty: bool,
}

impl SerdeJsonBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

fn to_serde(value: &GenericValue) -> Result<serde_json::Value, JsonError> {
    Ok(match value {
        GenericValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| JsonError::NonFiniteFloat(f.to_string()))?,
        GenericValue::Array(items) => serde_json::Value::Array(
            items.iter().map(to_serde).collect::<Result<Vec<_>, _>>()?,
        ),
        GenericValue::Object(fields) => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(k.clone(), to_serde(v)?);
            }
            serde_json::Value::Object(map)
        }
        other => serde_json::Value::from(other.clone()),
    })
}

impl JsonBackend for SerdeJsonBackend {
    fn to_string(&self, value: &GenericValue) -> Result<String, JsonError> {
        let json = to_serde(value)?;
        let out = if self.pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        };
        out.map_err(|e| JsonError::Serialize(e.to_string()))
    }

    fn from_str(&self, text: &str) -> Result<GenericValue, JsonError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(GenericValue::from(json))
    }

    fn from_slice(&self, bytes: &[u8]) -> Result<GenericValue, JsonError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(GenericValue::from(json))
    }
}
