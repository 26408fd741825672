use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{
    ALL_ATTRIBUTES, ALL_ATTRIBUTES_PATTERN, DEFAULT_MESSAGE_SIZE_THRESHOLD, MAX_BATCH_ENTRIES,
};
use crate::{
    digest, BatchResultErrorEntry, DeleteMessageBatchOutput, DeleteMessageBatchRequest,
    DeleteMessageRequest, Message, MessageAttributes, OffloadError, OffloadResult, QueueService,
    ReceiveMessageOutput, ReceiveMessageRequest, ResponseMetadata, SendMessageBatchOutput,
    SendMessageBatchRequest, SendMessageBatchResultEntry, SendMessageOutput, SendMessageRequest,
    SizeEvaluator, SystemAttributes,
};

const URL_PREFIX: &str = "memory://queues/";
const SENDER_ID: &str = "AIDAMEMORYQUEUE";

/// Failures reported by [`MemoryQueueService`], named after the provider's codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryQueueError {
    #[error("The specified queue does not exist: {0}")]
    QueueDoesNotExist(String),

    #[error("Message must be shorter than {max} bytes, got {size}")]
    MessageTooLong { size: usize, max: usize },

    #[error("The receipt handle is not valid: {0}")]
    ReceiptHandleIsInvalid(String),

    #[error("The batch request doesn't contain any entries")]
    EmptyBatchRequest,

    #[error("Maximum number of entries per request are {0}")]
    TooManyEntriesInBatchRequest(usize),

    #[error("Two or more batch entries in the request have the same Id: {0}")]
    BatchEntryIdsNotDistinct(String),

    #[error("Batch requests must total less than {max} bytes, got {size}")]
    BatchRequestTooLong { size: usize, max: usize },

    #[error("Invalid parameter value: {0}")]
    InvalidParameterValue(String),
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    attributes: MessageAttributes,
    md5_of_body: String,
    sent_timestamp: i64,
    first_receive_timestamp: Option<i64>,
    receive_count: u32,
    /// Latest handle issued by a receive
    receipt_handle: Option<String>,
    in_flight: bool,
    sequence_number: Option<String>,
}

/// In-memory queue service for tests and development.
///
/// Received messages stay hidden until deleted, except when the receive asks
/// for a zero visibility timeout. Clones share the same queues.
#[derive(Clone, Default)]
pub struct MemoryQueueService {
    queues: Arc<RwLock<HashMap<String, Vec<StoredMessage>>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryQueueService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue and return its URL
    pub fn create_queue(&self, name: &str) -> String {
        let url = format!("{}{}", URL_PREFIX, name);
        self.queues.write().entry(url.clone()).or_default();
        url
    }

    /// Messages currently stored, visible or not
    pub fn message_count(&self, queue_url: &str) -> usize {
        self.queues.read().get(queue_url).map_or(0, |messages| messages.len())
    }

    fn accept(
        &self,
        queue_url: &str,
        body: String,
        attributes: MessageAttributes,
        fifo: bool,
    ) -> OffloadResult<(String, String, Option<String>, Option<String>)> {
        validate_message(&attributes, &body)?;

        let message_id = Uuid::new_v4().to_string();
        let md5_of_body = digest::md5_of_body(&body);
        let md5_of_attributes = digest::md5_of_message_attributes(Some(&attributes));
        let sequence_number = fifo.then(|| {
            format!("{:020}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
        });

        let mut queues = self.queues.write();
        let messages = queues.get_mut(queue_url).ok_or_else(|| no_such_queue(queue_url))?;
        messages.push(StoredMessage {
            message_id: message_id.clone(),
            body,
            attributes,
            md5_of_body: md5_of_body.clone(),
            sent_timestamp: Utc::now().timestamp_millis(),
            first_receive_timestamp: None,
            receive_count: 0,
            receipt_handle: None,
            in_flight: false,
            sequence_number: sequence_number.clone(),
        });

        Ok((message_id, md5_of_body, md5_of_attributes, sequence_number))
    }

    fn ensure_queue(&self, queue_url: &str) -> OffloadResult<()> {
        if self.queues.read().contains_key(queue_url) {
            Ok(())
        } else {
            Err(no_such_queue(queue_url))
        }
    }
}

#[async_trait]
impl QueueService for MemoryQueueService {
    async fn send_message(&self, request: SendMessageRequest) -> OffloadResult<SendMessageOutput> {
        let body = request.message_body.ok_or_else(|| {
            OffloadError::queue(MemoryQueueError::InvalidParameterValue(
                "MessageBody is required".to_string(),
            ))
        })?;
        let fifo = request.message_group_id.is_some();
        let (message_id, md5_of_body, md5_of_attributes, sequence_number) =
            self.accept(&request.queue_url, body, request.message_attributes, fifo)?;

        Ok(SendMessageOutput {
            message_id: Some(message_id),
            md5_of_message_body: Some(md5_of_body),
            md5_of_message_attributes: md5_of_attributes,
            sequence_number,
            metadata: request_metadata(),
        })
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> OffloadResult<ReceiveMessageOutput> {
        let max = request.max_number_of_messages.unwrap_or(1);
        if !(1..=MAX_BATCH_ENTRIES as i32).contains(&max) {
            return Err(OffloadError::queue(MemoryQueueError::InvalidParameterValue(format!(
                "MaxNumberOfMessages must be between 1 and {}, got {}",
                MAX_BATCH_ENTRIES, max
            ))));
        }
        let keep_visible = request.visibility_timeout == Some(0);
        let system_names = request.attribute_names.unwrap_or_default();
        let attribute_names = request.message_attribute_names.unwrap_or_default();

        let mut queues = self.queues.write();
        let stored = queues
            .get_mut(&request.queue_url)
            .ok_or_else(|| no_such_queue(&request.queue_url))?;

        let now = Utc::now().timestamp_millis();
        let mut messages = Vec::new();
        for entry in stored.iter_mut().filter(|m| !m.in_flight).take(max as usize) {
            let receipt_handle = format!("AQEB{}", Uuid::new_v4().simple());
            entry.receive_count += 1;
            entry.first_receive_timestamp.get_or_insert(now);
            entry.receipt_handle = Some(receipt_handle.clone());
            entry.in_flight = !keep_visible;

            let message_attributes: MessageAttributes = entry
                .attributes
                .iter()
                .filter(|(name, _)| attribute_requested(&attribute_names, name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            let message_attributes = (!message_attributes.is_empty()).then_some(message_attributes);

            messages.push(Message {
                message_id: Some(entry.message_id.clone()),
                receipt_handle: Some(receipt_handle),
                body: Some(entry.body.clone()),
                md5_of_body: Some(entry.md5_of_body.clone()),
                md5_of_message_attributes: digest::md5_of_message_attributes(
                    message_attributes.as_ref(),
                ),
                attributes: system_attributes(entry, &system_names),
                message_attributes,
            });
        }

        Ok(ReceiveMessageOutput {
            messages: (!messages.is_empty()).then_some(messages),
            metadata: request_metadata(),
        })
    }

    async fn delete_message(&self, request: DeleteMessageRequest) -> OffloadResult<()> {
        let handle = request.receipt_handle.ok_or_else(|| {
            OffloadError::queue(MemoryQueueError::InvalidParameterValue(
                "ReceiptHandle is required".to_string(),
            ))
        })?;

        let mut queues = self.queues.write();
        let stored = queues
            .get_mut(&request.queue_url)
            .ok_or_else(|| no_such_queue(&request.queue_url))?;
        let position = stored
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(handle.as_str()))
            .ok_or_else(|| OffloadError::queue(MemoryQueueError::ReceiptHandleIsInvalid(handle)))?;
        stored.remove(position);
        Ok(())
    }

    async fn send_message_batch(
        &self,
        request: SendMessageBatchRequest,
    ) -> OffloadResult<SendMessageBatchOutput> {
        validate_batch(request.entries.iter().map(|e| e.id.as_str()))?;
        self.ensure_queue(&request.queue_url)?;

        let total: usize = request
            .entries
            .iter()
            .map(|e| {
                SizeEvaluator::message_size(
                    &e.message_attributes,
                    e.message_body.as_deref().unwrap_or_default(),
                )
            })
            .sum();
        if total > DEFAULT_MESSAGE_SIZE_THRESHOLD {
            return Err(OffloadError::queue(MemoryQueueError::BatchRequestTooLong {
                size: total,
                max: DEFAULT_MESSAGE_SIZE_THRESHOLD,
            }));
        }

        let mut output = SendMessageBatchOutput {
            metadata: request_metadata(),
            ..Default::default()
        };
        for entry in request.entries {
            let Some(body) = entry.message_body else {
                output.failed.push(BatchResultErrorEntry {
                    id: entry.id,
                    sender_fault: true,
                    code: "MissingParameter".to_string(),
                    message: Some("MessageBody is required".to_string()),
                });
                continue;
            };
            let fifo = entry.message_group_id.is_some();
            let (message_id, md5_of_body, md5_of_attributes, sequence_number) =
                self.accept(&request.queue_url, body, entry.message_attributes, fifo)?;
            output.successful.push(SendMessageBatchResultEntry {
                id: entry.id,
                message_id,
                md5_of_message_body: md5_of_body,
                md5_of_message_attributes: md5_of_attributes,
                sequence_number,
            });
        }
        Ok(output)
    }

    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> OffloadResult<DeleteMessageBatchOutput> {
        validate_batch(request.entries.iter().map(|e| e.id.as_str()))?;

        let mut queues = self.queues.write();
        let stored = queues
            .get_mut(&request.queue_url)
            .ok_or_else(|| no_such_queue(&request.queue_url))?;

        let mut output = DeleteMessageBatchOutput {
            metadata: request_metadata(),
            ..Default::default()
        };
        for entry in request.entries {
            let position = entry.receipt_handle.as_deref().and_then(|handle| {
                stored
                    .iter()
                    .position(|m| m.receipt_handle.as_deref() == Some(handle))
            });
            match position {
                Some(position) => {
                    stored.remove(position);
                    output.successful.push(entry.id);
                }
                None => output.failed.push(BatchResultErrorEntry {
                    id: entry.id,
                    sender_fault: true,
                    code: "ReceiptHandleIsInvalid".to_string(),
                    message: entry.receipt_handle,
                }),
            }
        }
        Ok(output)
    }
}

fn no_such_queue(queue_url: &str) -> OffloadError {
    OffloadError::queue(MemoryQueueError::QueueDoesNotExist(queue_url.to_string()))
}

fn request_metadata() -> ResponseMetadata {
    ResponseMetadata::with_request_id(Uuid::new_v4().to_string())
}

fn validate_message(attributes: &MessageAttributes, body: &str) -> OffloadResult<()> {
    if let Some((name, _)) = attributes
        .iter()
        .find(|(_, v)| v.string_value.is_none() && v.binary_value.is_none())
    {
        return Err(OffloadError::queue(MemoryQueueError::InvalidParameterValue(format!(
            "message attribute {} has no value",
            name
        ))));
    }
    if let Some((name, _)) = attributes
        .iter()
        .find(|(_, v)| v.string_value.is_some() && v.binary_value.is_some())
    {
        return Err(OffloadError::queue(MemoryQueueError::InvalidParameterValue(format!(
            "message attribute {} has both a string and a binary value",
            name
        ))));
    }

    let size = SizeEvaluator::message_size(attributes, body);
    if size > DEFAULT_MESSAGE_SIZE_THRESHOLD {
        return Err(OffloadError::queue(MemoryQueueError::MessageTooLong {
            size,
            max: DEFAULT_MESSAGE_SIZE_THRESHOLD,
        }));
    }
    Ok(())
}

fn validate_batch<'a>(ids: impl Iterator<Item = &'a str>) -> OffloadResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(OffloadError::queue(MemoryQueueError::InvalidParameterValue(
                "batch entry Id must not be empty".to_string(),
            )));
        }
        if !seen.insert(id) {
            return Err(OffloadError::queue(MemoryQueueError::BatchEntryIdsNotDistinct(
                id.to_string(),
            )));
        }
    }
    match seen.len() {
        0 => Err(OffloadError::queue(MemoryQueueError::EmptyBatchRequest)),
        n if n > MAX_BATCH_ENTRIES => Err(OffloadError::queue(
            MemoryQueueError::TooManyEntriesInBatchRequest(MAX_BATCH_ENTRIES),
        )),
        _ => Ok(()),
    }
}

/// `All` and `.*` match everything, `prefix.*` matches `prefix.` names,
/// anything else must match exactly.
fn attribute_requested(requested: &[String], name: &str) -> bool {
    requested.iter().any(|r| {
        if r == ALL_ATTRIBUTES || r == ALL_ATTRIBUTES_PATTERN {
            return true;
        }
        match r.strip_suffix(".*") {
            Some(prefix) => name
                .strip_prefix(prefix)
                .map_or(false, |rest| rest.starts_with('.')),
            None => r == name,
        }
    })
}

fn system_attributes(message: &StoredMessage, requested: &[String]) -> SystemAttributes {
    let all = requested.iter().any(|r| r == ALL_ATTRIBUTES);
    let mut available = vec![
        ("SenderId", SENDER_ID.to_string()),
        ("SentTimestamp", message.sent_timestamp.to_string()),
        ("ApproximateReceiveCount", message.receive_count.to_string()),
    ];
    if let Some(first) = message.first_receive_timestamp {
        available.push(("ApproximateFirstReceiveTimestamp", first.to_string()));
    }
    if let Some(sequence) = &message.sequence_number {
        available.push(("SequenceNumber", sequence.clone()));
    }

    available
        .into_iter()
        .filter(|(name, _)| all || requested.iter().any(|r| r == name))
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
