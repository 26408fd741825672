use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::{ALL_ATTRIBUTES, ALL_ATTRIBUTES_PATTERN, RESERVED_ATTRIBUTE_NAME};
use crate::{
    digest, DecodeError, DeleteMessageBatchRequestEntry, Message, MessageAttributeValue,
    MessageAttributes, ObjectStore, OffloadConfig, OffloadError, OffloadResult, PayloadPointer,
    ReceiptHandle, ReceiveMessageOutput, ReceiveMessageRequest, SendMessageBatchRequestEntry,
    SizeEvaluator, ValidationError,
};

/// Receive responses the engine can rehydrate in place, whatever their shape
pub trait ReceivedMessages {
    fn messages_mut(&mut self) -> &mut [Message];
}

impl ReceivedMessages for ReceiveMessageOutput {
    fn messages_mut(&mut self) -> &mut [Message] {
        self.messages.as_deref_mut().unwrap_or_default()
    }
}

impl ReceivedMessages for Vec<Message> {
    fn messages_mut(&mut self) -> &mut [Message] {
        self.as_mut_slice()
    }
}

/// Moves oversized payloads between queue messages and the object store.
///
/// The engine holds only its configuration and the store, so one instance
/// can be shared across tasks. Queue calls stay with the adapters; the engine
/// rewrites what goes in and what comes out.
pub struct OffloadEngine {
    store: Arc<dyn ObjectStore>,
    config: OffloadConfig,
    sizes: SizeEvaluator,
}

impl OffloadEngine {
    pub fn new<S: ObjectStore + 'static>(store: S, config: OffloadConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create an engine over a store that is also used elsewhere
    pub fn with_shared_store(store: Arc<dyn ObjectStore>, config: OffloadConfig) -> Self {
        let sizes = SizeEvaluator::new(config.message_size_threshold);
        Self {
            store,
            config,
            sizes,
        }
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    /// True when the message would exceed the configured threshold
    pub fn is_large(&self, attributes: &MessageAttributes, body: &str) -> bool {
        self.sizes.exceeds(attributes, body)
    }

    /// Rewrite an outgoing message, offloading its body when required.
    ///
    /// The object is written before this returns, so a failed queue send
    /// leaves at worst an unreferenced object behind.
    pub async fn build_outgoing(
        &self,
        attributes: MessageAttributes,
        body: Option<String>,
    ) -> OffloadResult<(MessageAttributes, String)> {
        validate_outgoing(&attributes, body.as_deref(), None)?;
        self.offload(attributes, body.unwrap_or_default()).await
    }

    /// Batch form of [`build_outgoing`](Self::build_outgoing). Every entry is
    /// validated before the first object is written.
    pub async fn build_outgoing_batch(
        &self,
        entries: &mut [SendMessageBatchRequestEntry],
    ) -> OffloadResult<()> {
        if entries.is_empty() {
            return Err(OffloadError::invalid("Entries must not be empty"));
        }
        for (i, entry) in entries.iter().enumerate() {
            validate_outgoing(&entry.message_attributes, entry.message_body.as_deref(), Some(i))?;
        }

        for entry in entries.iter_mut() {
            let attributes = std::mem::take(&mut entry.message_attributes);
            let body = entry.message_body.take().unwrap_or_default();
            let (attributes, body) = self.offload(attributes, body).await?;
            entry.message_attributes = attributes;
            entry.message_body = Some(body);
        }
        Ok(())
    }

    /// Make sure the receive asks for what rehydration needs: every standard
    /// attribute unless the caller chose some, and the reserved attribute
    /// unless a wildcard already covers it.
    pub fn prepare_receive(&self, request: &mut ReceiveMessageRequest) {
        request
            .attribute_names
            .get_or_insert_with(|| vec![ALL_ATTRIBUTES.to_string()]);

        let names = request.message_attribute_names.get_or_insert_with(Vec::new);
        let covered = names
            .iter()
            .any(|n| n == ALL_ATTRIBUTES || n == ALL_ATTRIBUTES_PATTERN || n == RESERVED_ATTRIBUTE_NAME);
        if !covered {
            names.push(RESERVED_ATTRIBUTE_NAME.to_string());
        }
    }

    /// Restore offloaded bodies in a receive response, keeping its shape
    pub async fn rehydrate<R: ReceivedMessages>(&self, mut response: R) -> OffloadResult<R> {
        for message in response.messages_mut() {
            self.rehydrate_message(message).await?;
        }
        Ok(response)
    }

    /// Restore one message. Messages without the reserved attribute are left
    /// untouched.
    pub async fn rehydrate_message(&self, message: &mut Message) -> OffloadResult<()> {
        if !message.has_attribute(RESERVED_ATTRIBUTE_NAME) {
            return Ok(());
        }

        let pointer = PayloadPointer::from_json(message.body.as_deref().unwrap_or_default())?;
        let bytes = self.store.get_object(&pointer.bucket, &pointer.key).await?;
        let body = String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 {
            bucket: pointer.bucket.clone(),
            key: pointer.key.clone(),
        })?;
        info!(bucket = %pointer.bucket, key = %pointer.key, "payload was read from object store");

        let mut attributes = message.message_attributes.take().unwrap_or_default();
        attributes.remove(RESERVED_ATTRIBUTE_NAME);
        if !attributes.is_empty() {
            message.message_attributes = Some(attributes);
        }
        message.md5_of_message_attributes =
            digest::md5_of_message_attributes(message.message_attributes.as_ref());
        message.md5_of_body = Some(digest::md5_of_body(&body));
        message.body = Some(body);

        let original = message.receipt_handle.take().unwrap_or_default();
        message.receipt_handle = Some(ReceiptHandle::new(pointer.bucket, pointer.key, original).encode());
        Ok(())
    }

    /// Resolve the handle to pass to the queue's delete. An encoded handle
    /// has its object deleted first and is unwrapped to the queue's own handle.
    pub async fn resolve_for_delete(&self, receipt_handle: Option<String>) -> OffloadResult<String> {
        let handle = receipt_handle.ok_or(ValidationError::MissingReceiptHandle { index: None })?;
        match ReceiptHandle::decode(&handle) {
            Some(decoded) => {
                self.delete_payload(&decoded).await?;
                Ok(decoded.original)
            }
            None => Ok(handle),
        }
    }

    /// Batch form of [`resolve_for_delete`](Self::resolve_for_delete).
    ///
    /// All entries are checked for a handle first; objects are then deleted
    /// entry by entry, and a failure does not restore earlier deletions.
    pub async fn resolve_batch_for_delete(
        &self,
        entries: &mut [DeleteMessageBatchRequestEntry],
    ) -> OffloadResult<()> {
        if entries.is_empty() {
            return Err(OffloadError::invalid("Entries must not be empty"));
        }
        if let Some(i) = entries.iter().position(|e| e.receipt_handle.is_none()) {
            return Err(ValidationError::MissingReceiptHandle { index: Some(i) }.into());
        }

        for entry in entries.iter_mut() {
            if let Some(decoded) = entry.receipt_handle.as_deref().and_then(ReceiptHandle::decode) {
                self.delete_payload(&decoded).await?;
                entry.receipt_handle = Some(decoded.original);
            }
        }
        Ok(())
    }

    async fn offload(
        &self,
        mut attributes: MessageAttributes,
        body: String,
    ) -> OffloadResult<(MessageAttributes, String)> {
        if !(self.config.always_through_s3 || self.sizes.exceeds(&attributes, &body)) {
            debug!(size = body.len(), "message kept inline");
            return Ok((attributes, body));
        }

        let bucket = &self.config.bucket_name;
        let key = Uuid::new_v4().to_string();
        let payload = Bytes::from(body.into_bytes());
        let size = payload.len();

        self.store
            .put_object(bucket, &key, payload, &self.config.write_params)
            .await?;
        info!(bucket = %bucket, key = %key, size, "payload was written into object store");

        attributes.insert(
            RESERVED_ATTRIBUTE_NAME.to_string(),
            MessageAttributeValue::number(size),
        );
        Ok((attributes, PayloadPointer::new(bucket.as_str(), key).to_json()))
    }

    async fn delete_payload(&self, handle: &ReceiptHandle) -> OffloadResult<()> {
        self.store.delete_object(&handle.bucket, &handle.key).await?;
        info!(bucket = %handle.bucket, key = %handle.key, "payload was deleted from object store");
        Ok(())
    }
}

fn validate_outgoing(
    attributes: &MessageAttributes,
    body: Option<&str>,
    index: Option<usize>,
) -> Result<(), ValidationError> {
    if attributes.contains_key(RESERVED_ATTRIBUTE_NAME) {
        return Err(ValidationError::ReservedAttribute { index });
    }
    if body.is_none() {
        return Err(ValidationError::MissingBody { index });
    }
    Ok(())
}
