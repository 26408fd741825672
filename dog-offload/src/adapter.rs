use std::sync::Arc;

use tracing::instrument;

use crate::{
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, DeleteMessageRequest, ExtendedQueue,
    OffloadEngine, OffloadResult, QueueService, ReceiveMessageOutput, ReceiveMessageRequest,
    SendMessageBatchOutput, SendMessageBatchRequest, SendMessageOutput, SendMessageRequest,
};

/// Queue client that offloads large payloads, client calling convention.
///
/// Every request names its queue URL. Operations keep the names and shapes of
/// the wrapped [`QueueService`]; the engine rewrites requests on the way in
/// and responses on the way out.
#[derive(Clone)]
pub struct ExtendedClient {
    queue: Arc<dyn QueueService>,
    engine: Arc<OffloadEngine>,
}

impl ExtendedClient {
    pub fn new<Q: QueueService + 'static>(queue: Q, engine: OffloadEngine) -> Self {
        Self::with_shared(Arc::new(queue), Arc::new(engine))
    }

    /// Create a client over a queue service and engine used elsewhere
    pub fn with_shared(queue: Arc<dyn QueueService>, engine: Arc<OffloadEngine>) -> Self {
        Self { queue, engine }
    }

    pub fn engine(&self) -> &OffloadEngine {
        &self.engine
    }

    /// The wrapped queue service, for calls that bypass offloading
    pub fn inner(&self) -> &dyn QueueService {
        self.queue.as_ref()
    }

    /// Bind to one queue, switching to the resource calling convention
    pub fn queue<S: Into<String>>(&self, queue_url: S) -> ExtendedQueue {
        ExtendedQueue::new(queue_url, self.queue.clone(), self.engine.clone())
    }

    #[instrument(skip_all, fields(queue_url = %request.queue_url))]
    pub async fn send_message(
        &self,
        mut request: SendMessageRequest,
    ) -> OffloadResult<SendMessageOutput> {
        let attributes = std::mem::take(&mut request.message_attributes);
        let (attributes, body) = self
            .engine
            .build_outgoing(attributes, request.message_body.take())
            .await?;
        request.message_attributes = attributes;
        request.message_body = Some(body);

        self.queue.send_message(request).await
    }

    #[instrument(skip_all, fields(queue_url = %request.queue_url))]
    pub async fn receive_message(
        &self,
        mut request: ReceiveMessageRequest,
    ) -> OffloadResult<ReceiveMessageOutput> {
        self.engine.prepare_receive(&mut request);
        let response = self.queue.receive_message(request).await?;
        self.engine.rehydrate(response).await
    }

    #[instrument(skip_all, fields(queue_url = %request.queue_url))]
    pub async fn delete_message(&self, mut request: DeleteMessageRequest) -> OffloadResult<()> {
        let handle = self
            .engine
            .resolve_for_delete(request.receipt_handle.take())
            .await?;
        request.receipt_handle = Some(handle);

        self.queue.delete_message(request).await
    }

    #[instrument(skip_all, fields(queue_url = %request.queue_url, entries = request.entries.len()))]
    pub async fn send_message_batch(
        &self,
        mut request: SendMessageBatchRequest,
    ) -> OffloadResult<SendMessageBatchOutput> {
        self.engine.build_outgoing_batch(&mut request.entries).await?;
        self.queue.send_message_batch(request).await
    }

    #[instrument(skip_all, fields(queue_url = %request.queue_url, entries = request.entries.len()))]
    pub async fn delete_message_batch(
        &self,
        mut request: DeleteMessageBatchRequest,
    ) -> OffloadResult<DeleteMessageBatchOutput> {
        self.engine.resolve_batch_for_delete(&mut request.entries).await?;
        self.queue.delete_message_batch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RESERVED_ATTRIBUTE_NAME;
    use crate::{
        DeleteMessageBatchRequestEntry, MemoryObjectStore, MemoryQueueService, MessageAttributeValue,
        OffloadConfig, OffloadError, PayloadPointer, ReceiptHandle, SendMessageBatchRequestEntry,
        ValidationError,
    };

    const BUCKET: &str = "payloads";

    fn client(config: OffloadConfig) -> (ExtendedClient, MemoryQueueService, MemoryObjectStore, String) {
        let store = MemoryObjectStore::new();
        store.create_bucket(BUCKET);
        let queue = MemoryQueueService::new();
        let url = queue.create_queue("test");
        let client = ExtendedClient::new(queue.clone(), OffloadEngine::new(store.clone(), config));
        (client, queue, store, url)
    }

    #[tokio::test]
    async fn large_message_round_trip() {
        let (client, queue, store, url) = client(OffloadConfig::new(BUCKET).with_threshold(16));
        let body = "a body longer than sixteen bytes";

        client
            .send_message(
                SendMessageRequest::new(&url, body)
                    .with_attribute("Author", MessageAttributeValue::string("alice")),
            )
            .await
            .unwrap();
        assert_eq!(store.object_count(BUCKET), 1);

        let response = client
            .receive_message(ReceiveMessageRequest::new(&url).with_message_attribute_names(["All"]))
            .await
            .unwrap();
        let message = &response.messages.as_ref().unwrap()[0];
        assert_eq!(message.body.as_deref(), Some(body));
        assert!(message.has_attribute("Author"));
        assert!(!message.has_attribute(RESERVED_ATTRIBUTE_NAME));
        assert!(response.metadata.request_id.is_some());

        let handle = message.receipt_handle.clone().unwrap();
        assert!(ReceiptHandle::is_encoded(&handle));
        client
            .delete_message(DeleteMessageRequest::new(&url, handle))
            .await
            .unwrap();
        assert_eq!(store.object_count(BUCKET), 0);
        assert_eq!(queue.message_count(&url), 0);
    }

    #[tokio::test]
    async fn raw_queue_sees_the_pointer() {
        let (client, queue, _, url) = client(OffloadConfig::new(BUCKET).always_through_s3());
        client.send_message(SendMessageRequest::new(&url, "hi")).await.unwrap();

        let raw = queue
            .receive_message(ReceiveMessageRequest::new(&url).with_message_attribute_names(["All"]))
            .await
            .unwrap();
        let message = &raw.messages.as_ref().unwrap()[0];
        let pointer = PayloadPointer::from_json(message.body.as_deref().unwrap()).unwrap();
        assert_eq!(pointer.bucket, BUCKET);
        assert_eq!(
            message.message_attributes.as_ref().unwrap()[RESERVED_ATTRIBUTE_NAME],
            MessageAttributeValue::number(2)
        );
    }

    #[tokio::test]
    async fn validation_happens_before_the_queue_is_called() {
        let (client, queue, _, url) = client(OffloadConfig::new(BUCKET));

        let err = client
            .send_message(
                SendMessageRequest::new(&url, "x")
                    .with_attribute(RESERVED_ATTRIBUTE_NAME, MessageAttributeValue::number(1)),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = client
            .delete_message(DeleteMessageRequest {
                queue_url: url.clone(),
                receipt_handle: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OffloadError::Validation(ValidationError::MissingReceiptHandle { index: None })
        ));
        assert_eq!(queue.message_count(&url), 0);
    }

    #[tokio::test]
    async fn batch_send_and_delete() {
        let (client, _, store, url) = client(OffloadConfig::new(BUCKET).with_threshold(8));

        let sent = client
            .send_message_batch(SendMessageBatchRequest {
                queue_url: url.clone(),
                entries: vec![
                    SendMessageBatchRequestEntry::new("small", "tiny"),
                    SendMessageBatchRequestEntry::new("large", "well over eight bytes"),
                ],
            })
            .await
            .unwrap();
        assert_eq!(sent.successful.len(), 2);
        assert_eq!(store.object_count(BUCKET), 1);

        let received = client
            .receive_message(ReceiveMessageRequest::new(&url).with_max_number_of_messages(10))
            .await
            .unwrap();
        let entries = received
            .messages
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, m)| DeleteMessageBatchRequestEntry::new(i.to_string(), m.receipt_handle.unwrap()))
            .collect();

        let deleted = client
            .delete_message_batch(DeleteMessageBatchRequest {
                queue_url: url,
                entries,
            })
            .await
            .unwrap();
        assert_eq!(deleted.successful.len(), 2);
        assert!(deleted.failed.is_empty());
        assert_eq!(store.object_count(BUCKET), 0);
    }
}
