//! # dog-offload: Large payloads for size-limited message queues
//!
//! `dog-offload` wraps an SQS-style queue client so that messages larger than
//! the queue's limit are written to S3-compatible object storage, while the
//! queue carries a small pointer record. Receivers get the original body back
//! and deleting a message also deletes its payload.
//!
//! ## Key Features
//!
//! - **Wire compatible**: pointer records, the `ExtendedPayloadSize` marker
//!   attribute and encoded receipt handles match the JVM and Python extended clients
//! - **Verifiable digests**: `MD5OfBody` and `MD5OfMessageAttributes` are recomputed
//!   after rehydration with the queue provider's own algorithm
//! - **Two calling conventions**: [`ExtendedClient`] takes explicit queue URLs,
//!   [`ExtendedQueue`] is bound to one queue and returns deletable [`QueueMessage`]s
//! - **Storage agnostic**: the engine only talks to the [`ObjectStore`] and
//!   [`QueueService`] traits; in-memory and AWS implementations are included
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_offload::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> OffloadResult<()> {
//! let store = MemoryObjectStore::new();
//! store.create_bucket("payloads");
//! let queues = MemoryQueueService::new();
//! let url = queues.create_queue("jobs");
//!
//! let engine = OffloadEngine::new(store, OffloadConfig::new("payloads"));
//! let client = ExtendedClient::new(queues, engine);
//!
//! let body = "x".repeat(300_000);
//! client.send_message(SendMessageRequest::new(&url, body.clone())).await?;
//!
//! let received = client.receive_message(ReceiveMessageRequest::new(&url)).await?;
//! let messages = received.messages.unwrap_or_default();
//! let message = &messages[0];
//! assert_eq!(message.body.as_deref(), Some(body.as_str()));
//!
//! let handle = message.receipt_handle.clone().unwrap_or_default();
//! client.delete_message(DeleteMessageRequest::new(&url, handle)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ ExtendedClient / ExtendedQueue│  ← calling conventions
//! ├───────────────────────────────┤
//! │        OffloadEngine          │  ← offload / rehydrate / resolve
//! ├───────────────┬───────────────┤
//! │  ObjectStore  │ QueueService  │  ← collaborators
//! └───────────────┴───────────────┘
//! ```

pub mod adapter;
pub mod config;
pub mod constants;
pub mod digest;
pub mod engine;
pub mod error;
pub mod memory;
pub mod pointer;
pub mod queue;
pub mod receipt;
pub mod resource;
pub mod size;
pub mod store;
pub mod types;

#[cfg(feature = "aws")]
pub mod aws;

pub use adapter::ExtendedClient;
pub use config::{ObjectWriteParams, OffloadConfig};
pub use engine::{OffloadEngine, ReceivedMessages};
pub use error::{DecodeError, OffloadError, OffloadResult, ValidationError};
pub use memory::{MemoryObjectStore, MemoryQueueError, MemoryQueueService, MemoryStoreError};
pub use pointer::PayloadPointer;
pub use queue::QueueService;
pub use receipt::ReceiptHandle;
pub use resource::{ExtendedQueue, QueueMessage};
pub use size::SizeEvaluator;
pub use store::ObjectStore;
pub use types::{
    BatchResultErrorEntry, DeleteMessageBatchOutput, DeleteMessageBatchRequest,
    DeleteMessageBatchRequestEntry, DeleteMessageRequest, Message, MessageAttributeValue,
    MessageAttributes, ReceiveMessageOutput, ReceiveMessageRequest, ResponseMetadata,
    SendMessageBatchOutput, SendMessageBatchRequest, SendMessageBatchRequestEntry,
    SendMessageBatchResultEntry, SendMessageOutput, SendMessageRequest, SystemAttributes,
};

#[cfg(feature = "aws")]
pub use aws::{S3ObjectStore, SqsQueueService};

/// Everything needed to build and use an extended client
pub mod prelude {
    pub use crate::{
        ExtendedClient, ExtendedQueue, OffloadConfig, OffloadEngine, QueueMessage,
    };

    pub use crate::{ObjectStore, ObjectWriteParams, QueueService};

    pub use crate::{MemoryObjectStore, MemoryQueueService};

    pub use crate::{
        DeleteMessageBatchRequest, DeleteMessageBatchRequestEntry, DeleteMessageRequest,
        Message, MessageAttributeValue, MessageAttributes, ReceiveMessageRequest,
        SendMessageBatchRequest, SendMessageBatchRequestEntry, SendMessageRequest,
    };

    pub use crate::{OffloadError, OffloadResult};

    #[cfg(feature = "aws")]
    pub use crate::{S3ObjectStore, SqsQueueService};

    pub use async_trait::async_trait;
}
