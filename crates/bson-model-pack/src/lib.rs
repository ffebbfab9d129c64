//! Wire formats for bson-model.
//!
//! - [`bson`]: a strict BSON encoder/decoder over [`BsonValue`] plus the BSON
//!   scalar types ([`ObjectId`], [`DateTime`], [`Binary`], [`Decimal128`]).
//! - [`GenericValue`]: the neutral JSON-like tree every JSON backend speaks.
//! - [`JsonBackend`]: the strategy for turning generic values into JSON text,
//!   with [`SerdeJsonBackend`] as the bundled implementation.

pub mod bson;
mod generic;
pub mod json;

pub use bson::{
    decode_document, encode_document, Binary, BsonDecoder, BsonDocument, BsonEncoder, BsonError,
    BsonValue, CodeWithScope, DateTime, DbPointer, Decimal128, ObjectId, Regex, Timestamp,
};
pub use generic::GenericValue;
pub use json::{JsonBackend, JsonError, SerdeJsonBackend};
