use async_trait::async_trait;
use bytes::Bytes;

use crate::{ObjectWriteParams, OffloadResult};

/// Object storage primitives needed to offload payloads.
///
/// Implementations report their own failures through
/// [`OffloadError::object_store`](crate::OffloadError::object_store); a put
/// into a missing bucket must fail with
/// [`OffloadError::BucketNotFound`](crate::OffloadError::BucketNotFound).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a whole object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        params: &ObjectWriteParams,
    ) -> OffloadResult<()>;

    /// Read a whole object
    async fn get_object(&self, bucket: &str, key: &str) -> OffloadResult<Bytes>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> OffloadResult<()>;
}
