use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

use crate::constants::MESSAGE_POINTER_CLASS;
use crate::error::DecodeError;

/// Location of an offloaded payload, carried as the queue message body.
///
/// Serializes to `{"s3BucketName": "...", "s3Key": "..."}`. The field names are
/// shared with the JVM and Python extended clients and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPointer {
    #[serde(rename = "s3BucketName")]
    pub bucket: String,
    #[serde(rename = "s3Key")]
    pub key: String,
}

impl PayloadPointer {
    pub fn new<B: Into<String>, K: Into<String>>(bucket: B, key: K) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Encode as `{"s3BucketName": "...", "s3Key": "..."}`, byte for byte
    /// what the Python client writes: sorted keys, `": "` and `", "`
    /// separators, non-ASCII escaped as `\uXXXX`.
    pub fn to_json(&self) -> String {
        let mut out = Vec::with_capacity(self.bucket.len() + self.key.len() + 36);
        let mut serializer = Serializer::with_formatter(&mut out, AsciiSpacedFormatter);
        // Fields serialize in declaration order, which is also key order.
        self.serialize(&mut serializer)
            .expect("string fields always serialize into memory");
        String::from_utf8(out).expect("formatter only writes ASCII")
    }

    /// Decode a pointer body. Accepts the plain object and the legacy
    /// `["software.amazon.payloadoffloading.PayloadS3Pointer", {...}]` envelope.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let data: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        let data = match data {
            Value::Array(mut items)
                if items.len() == 2 && items[0].as_str() == Some(MESSAGE_POINTER_CLASS) =>
            {
                items.swap_remove(1)
            }
            other => other,
        };

        let object = data.as_object().ok_or(DecodeError::MissingFields)?;
        match (object.get("s3BucketName"), object.get("s3Key")) {
            (Some(bucket), Some(key)) => Ok(Self {
                bucket: field_text(bucket),
                key: field_text(key),
            }),
            _ => Err(DecodeError::MissingFields),
        }
    }
}

/// JSON formatting of Python's `json.dumps` defaults
struct AsciiSpacedFormatter;

impl Formatter for AsciiSpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
