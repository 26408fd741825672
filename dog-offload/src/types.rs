use bytes::Bytes;
use std::collections::BTreeMap;

/// Message attributes, ordered by name
pub type MessageAttributes = BTreeMap<String, MessageAttributeValue>;

/// Standard (system) attributes returned with a received message
pub type SystemAttributes = BTreeMap<String, String>;

/// A single message attribute. At most one of `string_value` and
/// `binary_value` is populated; the queue rejects attributes carrying both,
/// and digests take the string value if both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttributeValue {
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Bytes>,
}

impl MessageAttributeValue {
    /// `String` attribute
    pub fn string<S: Into<String>>(value: S) -> Self {
        Self::with_string("String", value)
    }

    /// `Number` attribute, carried as its decimal text
    pub fn number<N: ToString>(value: N) -> Self {
        Self::with_string("Number", value.to_string())
    }

    /// `Binary` attribute
    pub fn binary<B: Into<Bytes>>(value: B) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }

    /// String-transported attribute with a custom data type such as `Number.int`
    pub fn with_string<T: Into<String>, S: Into<String>>(data_type: T, value: S) -> Self {
        Self {
            data_type: data_type.into(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }
}

/// A message as returned by the queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub md5_of_body: Option<String>,
    pub md5_of_message_attributes: Option<String>,
    pub attributes: SystemAttributes,
    pub message_attributes: Option<MessageAttributes>,
}

impl Message {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.message_attributes
            .as_ref()
            .map_or(false, |attrs| attrs.contains_key(name))
    }
}

/// Metadata the queue attaches to every response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub request_id: Option<String>,
}

impl ResponseMetadata {
    pub fn with_request_id<S: Into<String>>(request_id: S) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

/// Send a single message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub queue_url: String,
    pub message_body: Option<String>,
    pub message_attributes: MessageAttributes,
    pub delay_seconds: Option<i32>,
    pub message_deduplication_id: Option<String>,
    pub message_group_id: Option<String>,
}

impl SendMessageRequest {
    pub fn new<Q: Into<String>, B: Into<String>>(queue_url: Q, body: B) -> Self {
        Self {
            queue_url: queue_url.into(),
            message_body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Add a message attribute
    pub fn with_attribute<S: Into<String>>(mut self, name: S, value: MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }

    pub fn with_delay_seconds(mut self, seconds: i32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    /// FIFO group and deduplication ids
    pub fn with_fifo<G: Into<String>, D: Into<String>>(mut self, group_id: G, dedup_id: D) -> Self {
        self.message_group_id = Some(group_id.into());
        self.message_deduplication_id = Some(dedup_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageOutput {
    pub message_id: Option<String>,
    pub md5_of_message_body: Option<String>,
    pub md5_of_message_attributes: Option<String>,
    pub sequence_number: Option<String>,
    pub metadata: ResponseMetadata,
}

/// Receive up to `max_number_of_messages` messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageRequest {
    pub queue_url: String,
    /// Standard attributes to return; `None` means the caller did not ask
    pub attribute_names: Option<Vec<String>>,
    /// Message attributes to return; `None` means the caller did not ask
    pub message_attribute_names: Option<Vec<String>>,
    pub max_number_of_messages: Option<i32>,
    pub visibility_timeout: Option<i32>,
    pub wait_time_seconds: Option<i32>,
    pub receive_request_attempt_id: Option<String>,
}

impl ReceiveMessageRequest {
    pub fn new<Q: Into<String>>(queue_url: Q) -> Self {
        Self {
            queue_url: queue_url.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_message_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_number_of_messages(mut self, max: i32) -> Self {
        self.max_number_of_messages = Some(max);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }
}

/// Structured receive response: metadata plus an optional message list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageOutput {
    pub messages: Option<Vec<Message>>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageRequest {
    pub queue_url: String,
    pub receipt_handle: Option<String>,
}

impl DeleteMessageRequest {
    pub fn new<Q: Into<String>, R: Into<String>>(queue_url: Q, receipt_handle: R) -> Self {
        Self {
            queue_url: queue_url.into(),
            receipt_handle: Some(receipt_handle.into()),
        }
    }
}

/// One entry of a batch send, identified by a caller-chosen `id`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchRequestEntry {
    pub id: String,
    pub message_body: Option<String>,
    pub message_attributes: MessageAttributes,
    pub delay_seconds: Option<i32>,
    pub message_deduplication_id: Option<String>,
    pub message_group_id: Option<String>,
}

impl SendMessageBatchRequestEntry {
    pub fn new<I: Into<String>, B: Into<String>>(id: I, body: B) -> Self {
        Self {
            id: id.into(),
            message_body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn with_attribute<S: Into<String>>(mut self, name: S, value: MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchRequest {
    pub queue_url: String,
    pub entries: Vec<SendMessageBatchRequestEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchResultEntry {
    pub id: String,
    pub message_id: String,
    pub md5_of_message_body: String,
    pub md5_of_message_attributes: Option<String>,
    pub sequence_number: Option<String>,
}

/// Per-entry failure inside a batch response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResultErrorEntry {
    pub id: String,
    pub sender_fault: bool,
    pub code: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchOutput {
    pub successful: Vec<SendMessageBatchResultEntry>,
    pub failed: Vec<BatchResultErrorEntry>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchRequestEntry {
    pub id: String,
    pub receipt_handle: Option<String>,
}

impl DeleteMessageBatchRequestEntry {
    pub fn new<I: Into<String>, R: Into<String>>(id: I, receipt_handle: R) -> Self {
        Self {
            id: id.into(),
            receipt_handle: Some(receipt_handle.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchRequest {
    pub queue_url: String,
    pub entries: Vec<DeleteMessageBatchRequestEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchOutput {
    /// Ids of the entries that were deleted
    pub successful: Vec<String>,
    pub failed: Vec<BatchResultErrorEntry>,
    pub metadata: ResponseMetadata,
}
