use std::sync::Arc;

use tracing::instrument;

use crate::{
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, DeleteMessageBatchRequestEntry,
    DeleteMessageRequest, Message, OffloadEngine, OffloadResult, QueueService,
    ReceiveMessageRequest, SendMessageBatchOutput, SendMessageBatchRequest,
    SendMessageBatchRequestEntry, SendMessageOutput, SendMessageRequest,
};

/// Queue bound to one URL, resource calling convention.
///
/// Receives return bare [`QueueMessage`] values that remember where they came
/// from, so they can be deleted without repeating the queue or the handle.
#[derive(Clone)]
pub struct ExtendedQueue {
    url: String,
    queue: Arc<dyn QueueService>,
    engine: Arc<OffloadEngine>,
}

impl ExtendedQueue {
    pub fn new<S: Into<String>>(
        url: S,
        queue: Arc<dyn QueueService>,
        engine: Arc<OffloadEngine>,
    ) -> Self {
        Self {
            url: url.into(),
            queue,
            engine,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request for `body` on this queue, to extend with attributes, delay or
    /// FIFO ids before passing to [`send_message`](Self::send_message)
    pub fn message<B: Into<String>>(&self, body: B) -> SendMessageRequest {
        SendMessageRequest::new(&self.url, body)
    }

    /// Send a message; the request's queue URL is replaced by the bound one
    #[instrument(skip_all, fields(queue_url = %self.url))]
    pub async fn send_message(&self, mut request: SendMessageRequest) -> OffloadResult<SendMessageOutput> {
        request.queue_url = self.url.clone();
        let attributes = std::mem::take(&mut request.message_attributes);
        let (attributes, body) = self
            .engine
            .build_outgoing(attributes, request.message_body.take())
            .await?;
        request.message_attributes = attributes;
        request.message_body = Some(body);

        self.queue.send_message(request).await
    }

    /// Receive messages; the request's queue URL is replaced by the bound one
    #[instrument(skip_all, fields(queue_url = %self.url))]
    pub async fn receive_messages(
        &self,
        mut request: ReceiveMessageRequest,
    ) -> OffloadResult<Vec<QueueMessage>> {
        request.queue_url = self.url.clone();
        self.engine.prepare_receive(&mut request);

        let response = self.queue.receive_message(request).await?;
        let messages = self
            .engine
            .rehydrate(response.messages.unwrap_or_default())
            .await?;

        Ok(messages
            .into_iter()
            .map(|message| QueueMessage {
                message,
                queue: self.clone(),
            })
            .collect())
    }

    #[instrument(skip_all, fields(queue_url = %self.url, entries = entries.len()))]
    pub async fn send_messages(
        &self,
        mut entries: Vec<SendMessageBatchRequestEntry>,
    ) -> OffloadResult<SendMessageBatchOutput> {
        self.engine.build_outgoing_batch(&mut entries).await?;
        self.queue
            .send_message_batch(SendMessageBatchRequest {
                queue_url: self.url.clone(),
                entries,
            })
            .await
    }

    #[instrument(skip_all, fields(queue_url = %self.url, entries = entries.len()))]
    pub async fn delete_messages(
        &self,
        mut entries: Vec<DeleteMessageBatchRequestEntry>,
    ) -> OffloadResult<DeleteMessageBatchOutput> {
        self.engine.resolve_batch_for_delete(&mut entries).await?;
        self.queue
            .delete_message_batch(DeleteMessageBatchRequest {
                queue_url: self.url.clone(),
                entries,
            })
            .await
    }

    async fn delete_handle(&self, receipt_handle: Option<String>) -> OffloadResult<()> {
        let handle = self.engine.resolve_for_delete(receipt_handle).await?;
        self.queue
            .delete_message(DeleteMessageRequest::new(&self.url, handle))
            .await
    }
}

/// A received message bound to the queue it came from
#[derive(Clone)]
pub struct QueueMessage {
    message: Message,
    queue: ExtendedQueue,
}

impl QueueMessage {
    pub fn body(&self) -> Option<&str> {
        self.message.body.as_deref()
    }

    /// Receipt handle, encoded when the body was offloaded
    pub fn receipt_handle(&self) -> Option<&str> {
        self.message.receipt_handle.as_deref()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    /// Batch delete entry for this message
    pub fn delete_entry<S: Into<String>>(&self, id: S) -> DeleteMessageBatchRequestEntry {
        DeleteMessageBatchRequestEntry {
            id: id.into(),
            receipt_handle: self.message.receipt_handle.clone(),
        }
    }

    /// Delete this message, and its offloaded payload if any
    #[instrument(skip_all, fields(queue_url = %self.queue.url))]
    pub async fn delete(&self) -> OffloadResult<()> {
        self.queue
            .delete_handle(self.message.receipt_handle.clone())
            .await
    }
}

impl std::fmt::Debug for QueueMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueMessage")
            .field("queue_url", &self.queue.url)
            .field("message", &self.message)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ExtendedClient, MemoryObjectStore, MemoryQueueService, MessageAttributeValue, OffloadConfig,
        OffloadError, ReceiptHandle, ValidationError,
    };

    const BUCKET: &str = "payloads";

    fn bound_queue(config: OffloadConfig) -> (ExtendedQueue, MemoryQueueService, MemoryObjectStore) {
        let store = MemoryObjectStore::new();
        store.create_bucket(BUCKET);
        let service = MemoryQueueService::new();
        let url = service.create_queue("bound");
        let client = ExtendedClient::new(service.clone(), OffloadEngine::new(store.clone(), config));
        (client.queue(url), service, store)
    }

    #[tokio::test]
    async fn receive_returns_bound_messages() {
        let (queue, service, store) = bound_queue(OffloadConfig::new(BUCKET).always_through_s3());
        queue
            .send_message(queue.message("hello").with_attribute("Author", MessageAttributeValue::string("alice")))
            .await
            .unwrap();
        let messages = queue
            .receive_messages(ReceiveMessageRequest::default().with_message_attribute_names(["Author"]))
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.body(), Some("hello"));
        assert_eq!(
            message.message().md5_of_message_attributes.as_deref(),
            Some("e359dfbf3997df0b05607a5e2e457d9b")
        );
        assert!(ReceiptHandle::is_encoded(message.receipt_handle().unwrap()));

        message.delete().await.unwrap();
        assert_eq!(store.object_count(BUCKET), 0);
        assert_eq!(service.message_count(queue.url()), 0);
    }

    #[tokio::test]
    async fn empty_receive_is_an_empty_list() {
        let (queue, _, _) = bound_queue(OffloadConfig::new(BUCKET));
        let messages = queue.receive_messages(ReceiveMessageRequest::default()).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn batch_helpers_use_the_bound_url() {
        let (queue, service, store) = bound_queue(OffloadConfig::new(BUCKET).with_threshold(4));
        queue
            .send_messages(vec![
                SendMessageBatchRequestEntry::new("a", "ok"),
                SendMessageBatchRequestEntry::new("b", "offloaded"),
            ])
            .await
            .unwrap();
        assert_eq!(store.object_count(BUCKET), 1);

        let messages = queue
            .receive_messages(ReceiveMessageRequest::default().with_max_number_of_messages(10))
            .await
            .unwrap();
        let entries = messages
            .iter()
            .enumerate()
            .map(|(i, m)| m.delete_entry(i.to_string()))
            .collect();

        let output = queue.delete_messages(entries).await.unwrap();
        assert_eq!(output.successful.len(), 2);
        assert_eq!(service.message_count(queue.url()), 0);
        assert_eq!(store.object_count(BUCKET), 0);
    }

    #[tokio::test]
    async fn batch_send_reports_the_failing_index() {
        let (queue, service, store) = bound_queue(OffloadConfig::new(BUCKET));
        let err = queue
            .send_messages(vec![
                SendMessageBatchRequestEntry::new("a", "x"),
                SendMessageBatchRequestEntry {
                    id: "b".to_string(),
                    message_body: None,
                    ..Default::default()
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OffloadError::Validation(ValidationError::MissingBody { index: Some(1) })
        ));
        assert_eq!(service.message_count(queue.url()), 0);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn send_keeps_fifo_ids_and_rebinds_the_url() {
        let (queue, service, store) = bound_queue(OffloadConfig::new(BUCKET).always_through_s3());
        let mut request = queue.message("ordered").with_fifo("group-1", "dedup-1");
        request.queue_url = "https://elsewhere.example/other".to_string();

        let output = queue.send_message(request).await.unwrap();
        assert!(output.sequence_number.is_some());
        assert_eq!(service.message_count(queue.url()), 1);
        assert_eq!(store.object_count(BUCKET), 1);

        let messages = queue
            .receive_messages(ReceiveMessageRequest::default().with_attribute_names(["SequenceNumber"]))
            .await
            .unwrap();
        assert_eq!(messages[0].body(), Some("ordered"));
        assert_eq!(
            messages[0].message().attributes.get("SequenceNumber"),
            output.sequence_number.as_ref()
        );
    }

    #[tokio::test]
    async fn send_without_body_is_rejected() {
        let (queue, service, store) = bound_queue(OffloadConfig::new(BUCKET));
        let mut request = queue.message("");
        request.message_body = None;

        let err = queue.send_message(request).await.unwrap_err();
        assert!(matches!(
            err,
            OffloadError::Validation(ValidationError::MissingBody { index: None })
        ));
        assert_eq!(service.message_count(queue.url()), 0);
        assert_eq!(store.put_count(), 0);
    }
}
