//! BSON (Binary JSON) encoding and decoding.
//!
//! Every element type of the BSON specification decodes, including the
//! deprecated ones, so stored documents carrying server-internal values
//! (timestamps, regexes, min/max keys) still load. Unassigned type tags
//! fail with [`BsonError::UnsupportedType`].

pub mod decimal;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod values;

pub use decimal::Decimal128;
pub use decoder::BsonDecoder;
pub use encoder::BsonEncoder;
pub use error::BsonError;
pub use values::{
    Binary, BsonDocument, BsonValue, CodeWithScope, DateTime, DbPointer, ObjectId, Regex, Timestamp,
};

/// Encodes a top-level document.
pub fn encode_document(fields: &[(String, BsonValue)]) -> Result<Vec<u8>, BsonError> {
    BsonEncoder::new().encode(fields)
}

/// Decodes exactly one top-level document; trailing bytes are an error.
pub fn decode_document(data: &[u8]) -> Result<BsonDocument, BsonError> {
    BsonDecoder::new(data).decode()
}
