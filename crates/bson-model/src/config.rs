//! Codec and diff options.

use serde::Deserialize;

/// What decoding does with object keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    /// Keep them as untyped nodes so re-encoding reproduces the input.
    #[default]
    Retain,
    /// Drop them.
    Ignore,
    /// Fail with [`DecodeError::UnknownField`](crate::DecodeError::UnknownField).
    Reject,
}

/// What decoding does with declared fields missing from the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFields {
    /// Fill in the field's default value.
    #[default]
    Default,
    /// Fail with [`DecodeError::MissingField`](crate::DecodeError::MissingField).
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub unknown_fields: UnknownFields,
    pub missing_fields: MissingFields,
}

impl CodecOptions {
    /// Rejects both unknown and missing fields.
    pub fn strict() -> Self {
        Self {
            unknown_fields: UnknownFields::Reject,
            missing_fields: MissingFields::Reject,
        }
    }
}

/// How changed arrays are written into update documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayPolicy {
    /// `$push` for pure tail appends, per-index `$set` for in-place edits,
    /// whole-array `$set` otherwise.
    #[default]
    Minimal,
    /// Always `$set` the whole array.
    ReplaceWhole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub array_policy: ArrayPolicy,
}

/// Combined configuration, loadable from TOML:
///
/// ```toml
/// [codec]
/// unknown_fields = "reject"
///
/// [diff]
/// array_policy = "replace_whole"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub codec: CodecOptions,
    pub diff: DiffOptions,
}

impl ModelConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
