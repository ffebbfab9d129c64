//! BSON document decoder.
//!
//! BSON is a little-endian binary format. The decoder is strict: declared
//! lengths must match the bytes actually consumed, booleans must be 0 or 1,
//! and array keys must be the consecutive indices `"0"`, `"1"`, ...

use super::decimal::Decimal128;
use super::error::BsonError;
use super::values::{
    Binary, BsonDocument, BsonValue, CodeWithScope, DateTime, DbPointer, ObjectId, Regex, Timestamp,
};

/// Minimum size of an encoded document: 4-byte length + terminating null.
const MIN_DOCUMENT_SIZE: usize = 5;

/// BSON document decoder over a borrowed byte slice.
pub struct BsonDecoder<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> BsonDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    /// Decodes one top-level document and requires the input to end there.
    pub fn decode(mut self) -> Result<BsonDocument, BsonError> {
        let doc = self.read_document()?;
        if self.x != self.data.len() {
            return Err(BsonError::TrailingBytes(self.data.len() - self.x));
        }
        Ok(doc)
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BsonError> {
        if self.x + n > self.data.len() {
            Err(BsonError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], BsonError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, BsonError> {
        Ok(self.take::<1>()?[0])
    }

    fn i32_le(&mut self) -> Result<i32, BsonError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64_le(&mut self) -> Result<i64, BsonError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    fn f64_le(&mut self) -> Result<f64, BsonError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn buf(&mut self, n: usize) -> Result<&'a [u8], BsonError> {
        self.check(n)?;
        let data = &self.data[self.x..self.x + n];
        self.x += n;
        Ok(data)
    }

    /// Reads a declared i32 length, rejecting negatives and values below `min`.
    fn read_len(&mut self, min: usize) -> Result<usize, BsonError> {
        let raw = self.i32_le()?;
        let len = usize::try_from(raw).map_err(|_| BsonError::InvalidLength(i64::from(raw)))?;
        if len < min {
            return Err(BsonError::InvalidLength(i64::from(raw)));
        }
        Ok(len)
    }

    fn read_document(&mut self) -> Result<BsonDocument, BsonError> {
        let start = self.x;
        let size = self.read_len(MIN_DOCUMENT_SIZE)?;
        let end = start + size;
        if end > self.data.len() {
            return Err(BsonError::UnexpectedEof);
        }
        let mut fields = BsonDocument::new();
        loop {
            if self.x >= end {
                return Err(BsonError::InvalidLength(size as i64));
            }
            let element_type = self.u8()?;
            if element_type == 0 {
                break;
            }
            let key = self.read_cstring()?;
            let value = self.read_element_value(element_type)?;
            fields.push((key, value));
        }
        if self.x != end {
            return Err(BsonError::InvalidLength(size as i64));
        }
        Ok(fields)
    }

    fn read_cstring(&mut self) -> Result<String, BsonError> {
        let rest = &self.data[self.x..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BsonError::UnexpectedEof)?;
        let s = std::str::from_utf8(&rest[..nul]).map_err(|_| BsonError::InvalidUtf8)?;
        self.x += nul + 1; // skip null terminator
        Ok(s.to_string())
    }

    fn read_string(&mut self) -> Result<String, BsonError> {
        let length = self.read_len(1)?;
        let bytes = self.buf(length)?;
        let (body, terminator) = bytes.split_at(length - 1);
        if terminator[0] != 0 {
            return Err(BsonError::InvalidLength(length as i64));
        }
        std::str::from_utf8(body)
            .map(str::to_string)
            .map_err(|_| BsonError::InvalidUtf8)
    }

    fn read_element_value(&mut self, typ: u8) -> Result<BsonValue, BsonError> {
        match typ {
            0x01 => Ok(BsonValue::Float(self.f64_le()?)),
            0x02 => Ok(BsonValue::Str(self.read_string()?)),
            0x03 => Ok(BsonValue::Document(self.read_document()?)),
            0x04 => Ok(BsonValue::Array(self.read_array()?)),
            0x05 => self.read_binary(),
            0x06 => Ok(BsonValue::Undefined),
            0x07 => Ok(BsonValue::ObjectId(ObjectId::from_bytes(self.take()?))),
            0x08 => match self.u8()? {
                0 => Ok(BsonValue::Boolean(false)),
                1 => Ok(BsonValue::Boolean(true)),
                b => Err(BsonError::InvalidBoolean(b)),
            },
            0x09 => Ok(BsonValue::DateTime(DateTime::from_millis(self.i64_le()?))),
            0x0a => Ok(BsonValue::Null),
            0x0b => self.read_regex(),
            0x0c => self.read_db_pointer(),
            0x0d => Ok(BsonValue::JavaScriptCode(self.read_string()?)),
            0x0e => Ok(BsonValue::Symbol(self.read_string()?)),
            0x0f => self.read_code_with_scope(),
            0x10 => Ok(BsonValue::Int32(self.i32_le()?)),
            0x11 => self.read_timestamp(),
            0x12 => Ok(BsonValue::Int64(self.i64_le()?)),
            0x13 => Ok(BsonValue::Decimal128(Decimal128::from_bytes(self.take()?))),
            0xff => Ok(BsonValue::MinKey),
            0x7f => Ok(BsonValue::MaxKey),
            t => Err(BsonError::UnsupportedType(t)),
        }
    }

    fn read_array(&mut self) -> Result<Vec<BsonValue>, BsonError> {
        let fields = self.read_document()?;
        let mut items = Vec::with_capacity(fields.len());
        for (i, (key, value)) in fields.into_iter().enumerate() {
            let expected = i.to_string();
            if key != expected {
                return Err(BsonError::InvalidArrayKey {
                    expected,
                    found: key,
                });
            }
            items.push(value);
        }
        Ok(items)
    }

    fn read_binary(&mut self) -> Result<BsonValue, BsonError> {
        let length = self.read_len(0)?;
        let subtype = self.u8()?;
        let bytes = self.buf(length)?.to_vec();
        Ok(BsonValue::Binary(Binary { subtype, bytes }))
    }

    fn read_regex(&mut self) -> Result<BsonValue, BsonError> {
        let pattern = self.read_cstring()?;
        let options = self.read_cstring()?;
        Ok(BsonValue::Regex(Regex { pattern, options }))
    }

    fn read_db_pointer(&mut self) -> Result<BsonValue, BsonError> {
        let namespace = self.read_string()?;
        let id = ObjectId::from_bytes(self.take()?);
        Ok(BsonValue::DbPointer(DbPointer { namespace, id }))
    }

    /// The declared total length covers itself, the code string and the
    /// scope document.
    fn read_code_with_scope(&mut self) -> Result<BsonValue, BsonError> {
        let start = self.x;
        let total = self.read_len(4 + 5 + MIN_DOCUMENT_SIZE)?;
        let code = self.read_string()?;
        let scope = self.read_document()?;
        if self.x - start != total {
            return Err(BsonError::InvalidLength(total as i64));
        }
        Ok(BsonValue::JavaScriptCodeWithScope(CodeWithScope { code, scope }))
    }

    fn read_timestamp(&mut self) -> Result<BsonValue, BsonError> {
        let increment = u32::from_le_bytes(self.take()?);
        let time = u32::from_le_bytes(self.take()?);
        Ok(BsonValue::Timestamp(Timestamp { time, increment }))
    }
}
