//! Wire-level constants shared with the other extended-client implementations.

/// Message attribute marking a body as a pointer; its value is the byte length
/// of the offloaded payload.
pub const RESERVED_ATTRIBUTE_NAME: &str = "ExtendedPayloadSize";

/// Type tag of the legacy `[tag, pointer]` envelope written by the JVM clients.
pub const MESSAGE_POINTER_CLASS: &str = "software.amazon.payloadoffloading.PayloadS3Pointer";

/// Largest message the queue accepts (256 KiB).
pub const DEFAULT_MESSAGE_SIZE_THRESHOLD: usize = 1 << 18;

pub const S3_BUCKET_NAME_MARKER: &str = "-..s3BucketName..-";
pub const S3_KEY_MARKER: &str = "-..s3Key..-";

/// Requests every standard (system) attribute.
pub const ALL_ATTRIBUTES: &str = "All";

/// Alternative wildcard accepted for message attribute names.
pub const ALL_ATTRIBUTES_PATTERN: &str = ".*";

/// Default canned ACL for offloaded objects.
pub const DEFAULT_OBJECT_ACL: &str = "private";

/// Upper bound on entries per batch request.
pub const MAX_BATCH_ENTRIES: usize = 10;
