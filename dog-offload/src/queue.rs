use async_trait::async_trait;

use crate::{
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, DeleteMessageRequest, OffloadResult,
    ReceiveMessageOutput, ReceiveMessageRequest, SendMessageBatchOutput, SendMessageBatchRequest,
    SendMessageOutput, SendMessageRequest,
};

/// Queue service primitives, in the client calling convention where every
/// request names its queue URL.
///
/// Failures are reported through [`OffloadError::queue`](crate::OffloadError::queue)
/// and passed back to callers untouched.
#[async_trait]
pub trait QueueService: Send + Sync {
    async fn send_message(&self, request: SendMessageRequest) -> OffloadResult<SendMessageOutput>;

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> OffloadResult<ReceiveMessageOutput>;

    async fn delete_message(&self, request: DeleteMessageRequest) -> OffloadResult<()>;

    async fn send_message_batch(
        &self,
        request: SendMessageBatchRequest,
    ) -> OffloadResult<SendMessageBatchOutput>;

    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> OffloadResult<DeleteMessageBatchOutput>;
}
