use std::env;

use crate::constants::{DEFAULT_MESSAGE_SIZE_THRESHOLD, DEFAULT_OBJECT_ACL};
use crate::{OffloadError, OffloadResult};

/// Configuration for an offload engine
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    /// Bucket receiving offloaded payloads
    pub bucket_name: String,

    /// Messages strictly larger than this (by queue accounting) are offloaded
    pub message_size_threshold: usize,

    /// Offload every message regardless of size
    pub always_through_s3: bool,

    /// Parameters applied to every object write
    pub write_params: ObjectWriteParams,
}

/// Per-object write parameters passed to the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectWriteParams {
    /// Canned ACL, e.g. `private`
    pub acl: Option<String>,
    pub storage_class: Option<String>,
    pub content_type: Option<String>,
}

impl Default for ObjectWriteParams {
    fn default() -> Self {
        Self {
            acl: Some(DEFAULT_OBJECT_ACL.to_string()),
            storage_class: None,
            content_type: None,
        }
    }
}

impl ObjectWriteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acl<S: Into<String>>(mut self, acl: S) -> Self {
        self.acl = Some(acl.into());
        self
    }

    /// Leave the ACL to the bucket policy
    pub fn without_acl(mut self) -> Self {
        self.acl = None;
        self
    }

    pub fn with_storage_class<S: Into<String>>(mut self, storage_class: S) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl OffloadConfig {
    /// Create a config for the given bucket with defaults
    pub fn new<S: Into<String>>(bucket_name: S) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            message_size_threshold: DEFAULT_MESSAGE_SIZE_THRESHOLD,
            always_through_s3: false,
            write_params: ObjectWriteParams::default(),
        }
    }

    /// Load from `DOG_OFFLOAD_*` environment variables.
    ///
    /// `DOG_OFFLOAD_BUCKET` is required; `DOG_OFFLOAD_THRESHOLD`,
    /// `DOG_OFFLOAD_ALWAYS_THROUGH_S3` and `DOG_OFFLOAD_ACL` are optional.
    pub fn from_env() -> OffloadResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> OffloadResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("DOG_OFFLOAD_BUCKET")
            .filter(|b| !b.is_empty())
            .ok_or_else(|| OffloadError::invalid("DOG_OFFLOAD_BUCKET environment variable required"))?;
        let mut config = Self::new(bucket);

        if let Some(raw) = lookup("DOG_OFFLOAD_THRESHOLD") {
            let threshold = raw.parse::<usize>().map_err(|_| {
                OffloadError::invalid(format!("DOG_OFFLOAD_THRESHOLD must be a byte count, got {}", raw))
            })?;
            config = config.with_threshold(threshold);
        }

        if let Some(raw) = lookup("DOG_OFFLOAD_ALWAYS_THROUGH_S3") {
            let always = raw.parse::<bool>().map_err(|_| {
                OffloadError::invalid(format!(
                    "DOG_OFFLOAD_ALWAYS_THROUGH_S3 must be true or false, got {}",
                    raw
                ))
            })?;
            config.always_through_s3 = always;
        }

        if let Some(acl) = lookup("DOG_OFFLOAD_ACL") {
            config.write_params = if acl.is_empty() {
                config.write_params.without_acl()
            } else {
                config.write_params.with_acl(acl)
            };
        }

        Ok(config)
    }

    /// Set the size threshold in bytes
    pub fn with_threshold(mut self, bytes: usize) -> Self {
        self.message_size_threshold = bytes;
        self
    }

    /// Offload every message regardless of size
    pub fn always_through_s3(mut self) -> Self {
        self.always_through_s3 = true;
        self
    }

    pub fn with_write_params(mut self, params: ObjectWriteParams) -> Self {
        self.write_params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = OffloadConfig::new("bucket");
        assert_eq!(config.message_size_threshold, 262_144);
        assert!(!config.always_through_s3);
        assert_eq!(config.write_params.acl.as_deref(), Some("private"));
    }

    #[test]
    fn env_requires_a_bucket() {
        let err = OffloadConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn env_overrides() {
        let config = OffloadConfig::from_lookup(lookup(&[
            ("DOG_OFFLOAD_BUCKET", "payloads"),
            ("DOG_OFFLOAD_THRESHOLD", "1024"),
            ("DOG_OFFLOAD_ALWAYS_THROUGH_S3", "true"),
            ("DOG_OFFLOAD_ACL", ""),
        ]))
        .unwrap();

        assert_eq!(config.bucket_name, "payloads");
        assert_eq!(config.message_size_threshold, 1024);
        assert!(config.always_through_s3);
        assert_eq!(config.write_params.acl, None);
    }

    #[test]
    fn env_rejects_malformed_threshold() {
        let err = OffloadConfig::from_lookup(lookup(&[
            ("DOG_OFFLOAD_BUCKET", "payloads"),
            ("DOG_OFFLOAD_THRESHOLD", "big"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DOG_OFFLOAD_THRESHOLD"));
    }
}
