use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::operation::RequestId;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types as sqs;
use aws_sdk_sqs::Client;

use crate::{
    BatchResultErrorEntry, DeleteMessageBatchOutput, DeleteMessageBatchRequest,
    DeleteMessageRequest, Message, MessageAttributeValue, MessageAttributes, OffloadError,
    OffloadResult, QueueService, ReceiveMessageOutput, ReceiveMessageRequest, ResponseMetadata,
    SendMessageBatchOutput, SendMessageBatchRequest, SendMessageBatchResultEntry,
    SendMessageOutput, SendMessageRequest,
};

/// Queue service backed by Amazon SQS
#[derive(Clone)]
pub struct SqsQueueService {
    client: Client,
}

impl SqsQueueService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl QueueService for SqsQueueService {
    async fn send_message(&self, request: SendMessageRequest) -> OffloadResult<SendMessageOutput> {
        let result = self
            .client
            .send_message()
            .queue_url(request.queue_url)
            .set_message_body(request.message_body)
            .set_message_attributes(to_sqs_attributes(request.message_attributes)?)
            .set_delay_seconds(request.delay_seconds)
            .set_message_deduplication_id(request.message_deduplication_id)
            .set_message_group_id(request.message_group_id)
            .send()
            .await
            .map_err(OffloadError::queue)?;

        Ok(SendMessageOutput {
            metadata: metadata(result.request_id()),
            message_id: result.message_id,
            md5_of_message_body: result.md5_of_message_body,
            md5_of_message_attributes: result.md5_of_message_attributes,
            sequence_number: result.sequence_number,
        })
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> OffloadResult<ReceiveMessageOutput> {
        let system_names = request.attribute_names.map(|names| {
            names
                .iter()
                .map(|n| sqs::MessageSystemAttributeName::from(n.as_str()))
                .collect()
        });

        let result = self
            .client
            .receive_message()
            .queue_url(request.queue_url)
            .set_message_system_attribute_names(system_names)
            .set_message_attribute_names(request.message_attribute_names)
            .set_max_number_of_messages(request.max_number_of_messages)
            .set_visibility_timeout(request.visibility_timeout)
            .set_wait_time_seconds(request.wait_time_seconds)
            .set_receive_request_attempt_id(request.receive_request_attempt_id)
            .send()
            .await
            .map_err(OffloadError::queue)?;

        let metadata = metadata(result.request_id());
        let messages = result
            .messages
            .map(|messages| messages.into_iter().map(from_sqs_message).collect());
        Ok(ReceiveMessageOutput { messages, metadata })
    }

    async fn delete_message(&self, request: DeleteMessageRequest) -> OffloadResult<()> {
        self.client
            .delete_message()
            .queue_url(request.queue_url)
            .set_receipt_handle(request.receipt_handle)
            .send()
            .await
            .map_err(OffloadError::queue)?;
        Ok(())
    }

    async fn send_message_batch(
        &self,
        request: SendMessageBatchRequest,
    ) -> OffloadResult<SendMessageBatchOutput> {
        let entries = request
            .entries
            .into_iter()
            .map(|entry| {
                sqs::SendMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .set_message_body(entry.message_body)
                    .set_message_attributes(to_sqs_attributes(entry.message_attributes)?)
                    .set_delay_seconds(entry.delay_seconds)
                    .set_message_deduplication_id(entry.message_deduplication_id)
                    .set_message_group_id(entry.message_group_id)
                    .build()
                    .map_err(OffloadError::queue)
            })
            .collect::<OffloadResult<Vec<_>>>()?;

        let result = self
            .client
            .send_message_batch()
            .queue_url(request.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(OffloadError::queue)?;

        Ok(SendMessageBatchOutput {
            metadata: metadata(result.request_id()),
            successful: result
                .successful
                .into_iter()
                .map(|e| SendMessageBatchResultEntry {
                    id: e.id,
                    message_id: e.message_id,
                    md5_of_message_body: e.md5_of_message_body,
                    md5_of_message_attributes: e.md5_of_message_attributes,
                    sequence_number: e.sequence_number,
                })
                .collect(),
            failed: result.failed.into_iter().map(from_sqs_failure).collect(),
        })
    }

    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> OffloadResult<DeleteMessageBatchOutput> {
        let entries = request
            .entries
            .into_iter()
            .map(|entry| {
                sqs::DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .set_receipt_handle(entry.receipt_handle)
                    .build()
                    .map_err(OffloadError::queue)
            })
            .collect::<OffloadResult<Vec<_>>>()?;

        let result = self
            .client
            .delete_message_batch()
            .queue_url(request.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(OffloadError::queue)?;

        Ok(DeleteMessageBatchOutput {
            metadata: metadata(result.request_id()),
            successful: result.successful.into_iter().map(|e| e.id).collect(),
            failed: result.failed.into_iter().map(from_sqs_failure).collect(),
        })
    }
}

fn metadata(request_id: Option<&str>) -> ResponseMetadata {
    ResponseMetadata {
        request_id: request_id.map(str::to_string),
    }
}

fn to_sqs_attributes(
    attributes: MessageAttributes,
) -> OffloadResult<Option<HashMap<String, sqs::MessageAttributeValue>>> {
    if attributes.is_empty() {
        return Ok(None);
    }
    attributes
        .into_iter()
        .map(|(name, value)| {
            let value = sqs::MessageAttributeValue::builder()
                .data_type(value.data_type)
                .set_string_value(value.string_value)
                .set_binary_value(value.binary_value.map(|b| Blob::new(b.to_vec())))
                .build()
                .map_err(OffloadError::queue)?;
            Ok((name, value))
        })
        .collect::<OffloadResult<HashMap<_, _>>>()
        .map(Some)
}

fn from_sqs_message(message: sqs::Message) -> Message {
    let message_attributes = message.message_attributes.map(|attrs| {
        attrs
            .into_iter()
            .map(|(name, value)| {
                let value = MessageAttributeValue {
                    data_type: value.data_type,
                    string_value: value.string_value,
                    binary_value: value.binary_value.map(|b| b.into_inner().into()),
                };
                (name, value)
            })
            .collect()
    });

    Message {
        message_id: message.message_id,
        receipt_handle: message.receipt_handle,
        body: message.body,
        md5_of_body: message.md5_of_body,
        md5_of_message_attributes: message.md5_of_message_attributes,
        attributes: message
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect(),
        message_attributes,
    }
}

fn from_sqs_failure(entry: sqs::BatchResultErrorEntry) -> BatchResultErrorEntry {
    BatchResultErrorEntry {
        id: entry.id,
        sender_fault: entry.sender_fault,
        code: entry.code,
        message: entry.message,
    }
}
