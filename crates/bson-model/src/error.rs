//! Error types for bson-model operations.

use bson_model_pack::{BsonError, JsonError};
use bson_model_path::Path;
use thiserror::Error;

/// A wire value does not fit the declared shape.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: String,
        found: &'static str,
    },

    #[error("missing field {path}")]
    MissingField { path: Path },

    #[error("unknown field {path}")]
    UnknownField { path: Path },

    #[error("duplicate field {path}")]
    DuplicateField { path: Path },

    #[error("invalid map key {key:?} at {path}")]
    InvalidMapKey { path: Path, key: String },

    #[error("value {value} out of range for {expected} at {path}")]
    OutOfRange {
        path: Path,
        value: String,
        expected: &'static str,
    },

    #[error("malformed value at {path}: {message}")]
    Malformed { path: Path, message: String },

    #[error("bson: {0}")]
    Bson(#[from] BsonError),

    #[error("json: {0}")]
    Json(#[from] JsonError),
}

impl DecodeError {
    #[inline]
    pub fn type_mismatch(path: &Path, expected: impl Into<String>, found: &'static str) -> Self {
        DecodeError::TypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            found,
        }
    }

    #[inline]
    pub fn malformed(path: &Path, message: impl Into<String>) -> Self {
        DecodeError::Malformed {
            path: path.clone(),
            message: message.into(),
        }
    }
}

/// A read or write addressed something that is not there or not allowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("path not found: {path}")]
    NotFound { path: Path },

    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfRange { path: Path, index: usize, len: usize },

    #[error("{path} is a {found}, not a container")]
    NotAContainer { path: Path, found: &'static str },

    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: String,
        found: &'static str,
    },

    #[error("field {path} is not declared by the schema")]
    UndeclaredField { path: Path },

    #[error("invalid map key {key:?} at {path}")]
    InvalidMapKey { path: Path, key: String },

    #[error("the document root cannot be replaced or removed")]
    RootTarget,
}

impl AccessError {
    /// Re-roots the error path under `prefix`.
    ///
    /// Node-local operations report paths relative to the node; callers
    /// that reached the node through a longer path use this to report the
    /// full location.
    pub fn with_prefix(self, prefix: &Path) -> Self {
        match self {
            AccessError::NotFound { path } => AccessError::NotFound {
                path: prefix.join(&path),
            },
            AccessError::IndexOutOfRange { path, index, len } => AccessError::IndexOutOfRange {
                path: prefix.join(&path),
                index,
                len,
            },
            AccessError::NotAContainer { path, found } => AccessError::NotAContainer {
                path: prefix.join(&path),
                found,
            },
            AccessError::TypeMismatch {
                path,
                expected,
                found,
            } => AccessError::TypeMismatch {
                path: prefix.join(&path),
                expected,
                found,
            },
            AccessError::UndeclaredField { path } => AccessError::UndeclaredField {
                path: prefix.join(&path),
            },
            AccessError::InvalidMapKey { path, key } => AccessError::InvalidMapKey {
                path: prefix.join(&path),
                key,
            },
            AccessError::RootTarget => AccessError::RootTarget,
        }
    }
}

/// The operation is not allowed in the model's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("identifier {field} is already set to {current}")]
    IdentifierAlreadySet { field: String, current: String },

    #[error("identifier {field} is not set")]
    IdentifierUnset { field: String },

    #[error("identifier {field} can only be assigned through set_id")]
    IdentifierField { field: String },
}

/// A schema definition is inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("identifier field {field} is not declared")]
    IdentifierMissing { field: String },

    #[error("identifier field {field} must be a scalar, found {found}")]
    IdentifierNotScalar { field: String, found: String },

    #[error("field name {field:?} cannot appear in a dot-notation path")]
    InvalidFieldName { field: String },

    #[error("field {field} is declared twice")]
    DuplicateField { field: String },

    #[error("default for field {field} does not match its shape: {reason}")]
    InvalidDefault { field: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("bson: {0}")]
    Bson(#[from] BsonError),

    #[error("json: {0}")]
    Json(#[from] JsonError),
}

/// Umbrella error for model-level operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
