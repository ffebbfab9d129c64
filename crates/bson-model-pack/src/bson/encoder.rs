//! BSON document encoder.
//!
//! BSON is a little-endian binary format. All multi-byte integers are
//! written in little-endian byte order; document and string lengths are
//! back-patched once the body has been written.

use super::error::BsonError;
use super::values::BsonValue;

/// Encodes a BSON document (a slice of key-value pairs) to bytes.
///
/// The top-level must always be a document (list of key-value pairs). BSON
/// does not have a scalar top-level encoding.
pub struct BsonEncoder;

impl Default for BsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes a BSON document to bytes.
    pub fn encode(&self, fields: &[(String, BsonValue)]) -> Result<Vec<u8>, BsonError> {
        let mut buf = Vec::new();
        self.write_document(&mut buf, fields.iter().map(|(k, v)| (k.as_str(), v)))?;
        Ok(buf)
    }

    fn write_document<'a, I>(&self, buf: &mut Vec<u8>, fields: I) -> Result<(), BsonError>
    where
        I: Iterator<Item = (&'a str, &'a BsonValue)>,
    {
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 4]); // size placeholder
        for (key, value) in fields {
            self.write_key_value(buf, key, value)?;
        }
        buf.push(0); // terminating null byte
        self.patch_len(buf, start)
    }

    fn write_array(&self, buf: &mut Vec<u8>, items: &[BsonValue]) -> Result<(), BsonError> {
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 4]);
        for (i, item) in items.iter().enumerate() {
            self.write_key_value(buf, &i.to_string(), item)?;
        }
        buf.push(0);
        self.patch_len(buf, start)
    }

    fn patch_len(&self, buf: &mut [u8], start: usize) -> Result<(), BsonError> {
        let len = buf.len() - start;
        let size = i32::try_from(len).map_err(|_| BsonError::InvalidLength(len as i64))?;
        buf[start..start + 4].copy_from_slice(&size.to_le_bytes());
        Ok(())
    }

    fn write_key_value(
        &self,
        buf: &mut Vec<u8>,
        key: &str,
        value: &BsonValue,
    ) -> Result<(), BsonError> {
        buf.push(value.element_type());
        self.write_cstring(buf, key)?;
        match value {
            BsonValue::Float(f) => buf.extend_from_slice(&f.to_le_bytes()),
            BsonValue::Str(s) => self.write_string(buf, s)?,
            BsonValue::Document(fields) => {
                self.write_document(buf, fields.iter().map(|(k, v)| (k.as_str(), v)))?
            }
            BsonValue::Array(items) => self.write_array(buf, items)?,
            BsonValue::Binary(bin) => {
                let len = i32::try_from(bin.bytes.len())
                    .map_err(|_| BsonError::InvalidLength(bin.bytes.len() as i64))?;
                buf.extend_from_slice(&len.to_le_bytes());
                buf.push(bin.subtype);
                buf.extend_from_slice(&bin.bytes);
            }
            BsonValue::ObjectId(id) => buf.extend_from_slice(&id.bytes()),
            BsonValue::Boolean(b) => buf.push(u8::from(*b)),
            BsonValue::DateTime(dt) => buf.extend_from_slice(&dt.timestamp_millis().to_le_bytes()),
            BsonValue::Null | BsonValue::Undefined | BsonValue::MinKey | BsonValue::MaxKey => {}
            BsonValue::Regex(re) => {
                self.write_cstring(buf, &re.pattern)?;
                self.write_cstring(buf, &re.options)?;
            }
            BsonValue::DbPointer(ptr) => {
                self.write_string(buf, &ptr.namespace)?;
                buf.extend_from_slice(&ptr.id.bytes());
            }
            BsonValue::JavaScriptCode(code) | BsonValue::Symbol(code) => {
                self.write_string(buf, code)?
            }
            BsonValue::JavaScriptCodeWithScope(cws) => {
                let start = buf.len();
                buf.extend_from_slice(&[0u8; 4]); // total size placeholder
                self.write_string(buf, &cws.code)?;
                self.write_document(buf, cws.scope.iter().map(|(k, v)| (k.as_str(), v)))?;
                self.patch_len(buf, start)?;
            }
            BsonValue::Int32(i) => buf.extend_from_slice(&i.to_le_bytes()),
            BsonValue::Timestamp(ts) => {
                buf.extend_from_slice(&ts.increment.to_le_bytes());
                buf.extend_from_slice(&ts.time.to_le_bytes());
            }
            BsonValue::Int64(i) => buf.extend_from_slice(&i.to_le_bytes()),
            BsonValue::Decimal128(dec) => buf.extend_from_slice(&dec.bytes()),
        }
        Ok(())
    }

    /// Writes a null-terminated C-string (keys, regex pattern and options),
    /// which cannot carry a NUL byte.
    fn write_cstring(&self, buf: &mut Vec<u8>, s: &str) -> Result<(), BsonError> {
        if s.as_bytes().contains(&0) {
            return Err(BsonError::KeyContainsNul(s.to_string()));
        }
        buf.extend_from_slice(s.as_bytes());
        buf.push(0); // null terminator
        Ok(())
    }

    /// Writes a BSON string: little-endian i32 (byte_count+1) + UTF-8 bytes + null byte.
    fn write_string(&self, buf: &mut Vec<u8>, s: &str) -> Result<(), BsonError> {
        let bytes = s.as_bytes();
        let len = i32::try_from(bytes.len() + 1)
            .map_err(|_| BsonError::InvalidLength(bytes.len() as i64))?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(bytes);
        buf.push(0); // null terminator
        Ok(())
    }
}
