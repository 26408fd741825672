use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{S3_BUCKET_NAME_MARKER, S3_KEY_MARKER};

static RECEIPT_HANDLE_MATCHER: Lazy<Regex> = Lazy::new(|| {
    let bucket = regex::escape(S3_BUCKET_NAME_MARKER);
    let key = regex::escape(S3_KEY_MARKER);
    Regex::new(&format!(
        "(?s)^{bucket}(.*?){bucket}{key}(.*?){key}(.*)$",
        bucket = bucket,
        key = key,
    ))
    .expect("receipt handle pattern is valid")
});

/// Receipt handle that also names the object holding an offloaded payload.
///
/// Wire form: `-..s3BucketName..-<bucket>-..s3BucketName..--..s3Key..-<key>-..s3Key..-<original>`.
/// The queue never sees this form; it is unwrapped back to `original` on delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHandle {
    pub bucket: String,
    pub key: String,
    pub original: String,
}

impl ReceiptHandle {
    pub fn new<B, K, O>(bucket: B, key: K, original: O) -> Self
    where
        B: Into<String>,
        K: Into<String>,
        O: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            original: original.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{marker_b}{bucket}{marker_b}{marker_k}{key}{marker_k}{original}",
            marker_b = S3_BUCKET_NAME_MARKER,
            marker_k = S3_KEY_MARKER,
            bucket = self.bucket,
            key = self.key,
            original = self.original,
        )
    }

    /// Parse an encoded handle; `None` means a plain queue handle
    pub fn decode(handle: &str) -> Option<Self> {
        let captures = RECEIPT_HANDLE_MATCHER.captures(handle)?;
        Some(Self {
            bucket: captures.get(1)?.as_str().to_string(),
            key: captures.get(2)?.as_str().to_string(),
            original: captures.get(3)?.as_str().to_string(),
        })
    }

    pub fn is_encoded(handle: &str) -> bool {
        RECEIPT_HANDLE_MATCHER.is_match(handle)
    }
}

impl std::fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
