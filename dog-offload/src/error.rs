use thiserror::Error;

use crate::constants::RESERVED_ATTRIBUTE_NAME;

/// Result type for offload operations
pub type OffloadResult<T> = Result<T, OffloadError>;

/// Errors that can occur while offloading, rehydrating or deleting messages
#[derive(Error, Debug)]
pub enum OffloadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Bucket does not exist: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("Object store error: {source}")]
    ObjectStore {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Queue service error: {source}")]
    Queue {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Caller mistakes, always raised before any remote call is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} is reserved name{}", RESERVED_ATTRIBUTE_NAME, found_in(.index))]
    ReservedAttribute { index: Option<usize> },

    #[error("message body is required{}", found_in(.index))]
    MissingBody { index: Option<usize> },

    #[error("missing ReceiptHandle{}", found_in(.index))]
    MissingReceiptHandle { index: Option<usize> },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// Failures to interpret a pointer record or the payload it points to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid json data: {0}")]
    InvalidJson(String),

    #[error("invalid json data. s3BucketName and s3Key must be keys")]
    MissingFields,

    #[error("object {key} in {bucket} is not valid UTF-8")]
    InvalidUtf8 { bucket: String, key: String },
}

fn found_in(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(", found in entry {}", i),
        None => String::new(),
    }
}

impl OffloadError {
    /// Wrap an object store failure
    pub fn object_store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ObjectStore {
            source: Box::new(error),
        }
    }

    /// Wrap a queue service failure
    pub fn queue<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Queue {
            source: Box::new(error),
        }
    }

    pub fn bucket_not_found<S: Into<String>>(bucket: S) -> Self {
        Self::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Validation(ValidationError::InvalidArgument {
            message: message.into(),
        })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for failures reported by the object store or the queue service
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::BucketNotFound { .. } | Self::ObjectStore { .. } | Self::Queue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_errors_name_the_entry_index() {
        let err = ValidationError::ReservedAttribute { index: Some(1) };
        assert_eq!(err.to_string(), "ExtendedPayloadSize is reserved name, found in entry 1");

        let err = ValidationError::MissingReceiptHandle { index: Some(0) };
        assert_eq!(err.to_string(), "missing ReceiptHandle, found in entry 0");
    }

    #[test]
    fn single_errors_have_no_index() {
        let err = OffloadError::from(ValidationError::MissingBody { index: None });
        assert_eq!(err.to_string(), "message body is required");
        assert!(err.is_validation());
        assert!(!err.is_remote());
    }

    #[test]
    fn remote_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = OffloadError::object_store(io);
        assert!(err.is_remote());
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
