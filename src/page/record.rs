//! Record representation and serialization.
//!
//! A [`Record`] is an ordered vector of string fields — the engine imposes
//! no per-field typing at this layer; the schema registry interprets fields
//! when a join key is extracted.

use bytes::{Buf, BufMut};

/// A row of string fields.
///
/// # Serialization Format
///
/// ```text
/// +------------------+
/// | field_count: u32 |
/// +------------------+
/// | len: u32 | bytes |  field 0
/// | len: u32 | bytes |  field 1
/// | ...              |
/// +------------------+
/// ```
///
/// All integers are little-endian. Field bytes are UTF-8 and pass through
/// the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    /// Creates a record from the given fields.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Returns the field at `index`, or `None` if out of range.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Returns all fields in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a new record holding this record's fields followed by
    /// `other`'s fields. This is the merge operation every join executor
    /// uses to build output rows.
    pub fn concat(&self, other: &Record) -> Record {
        let mut fields = Vec::with_capacity(self.fields.len() + other.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend_from_slice(&other.fields);
        Record::new(fields)
    }

    /// Returns the number of bytes [`encode`](Self::encode) will write.
    pub fn serialized_size(&self) -> usize {
        4 + self.fields.iter().map(|f| 4 + f.len()).sum::<usize>()
    }

    /// Encodes this record into `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is smaller than [`serialized_size`](Self::serialized_size).
    /// Callers check capacity before encoding; the page codec never calls
    /// this without room.
    pub fn encode(&self, mut buf: &mut [u8]) {
        buf.put_u32_le(self.fields.len() as u32);
        for field in &self.fields {
            buf.put_u32_le(field.len() as u32);
            buf.put_slice(field.as_bytes());
        }
    }

    /// Decodes a record from `buf`, which must span exactly the record's
    /// serialized bytes (as recorded in its slot).
    ///
    /// Returns a human-readable reason on failure; the page codec wraps it
    /// into [`PageError::CorruptRecord`](super::PageError).
    pub fn decode(mut buf: &[u8]) -> Result<Self, String> {
        if buf.remaining() < 4 {
            return Err("missing field count".to_string());
        }
        let field_count = buf.get_u32_le() as usize;

        let mut fields = Vec::with_capacity(field_count);
        for i in 0..field_count {
            if buf.remaining() < 4 {
                return Err(format!("missing length for field {}", i));
            }
            let len = buf.get_u32_le() as usize;
            if buf.remaining() < len {
                return Err(format!(
                    "field {} wants {} bytes, {} remain",
                    i,
                    len,
                    buf.remaining()
                ));
            }
            let raw = buf.copy_to_bytes(len);
            let text = String::from_utf8(raw.to_vec())
                .map_err(|e| format!("field {} is not UTF-8: {}", i, e))?;
            fields.push(text);
        }

        if buf.has_remaining() {
            return Err(format!("{} trailing bytes after last field", buf.remaining()));
        }

        Ok(Record::new(fields))
    }
}
