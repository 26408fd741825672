//! In-memory backends for tests and local development

mod queue;
mod store;

pub use queue::{MemoryQueueError, MemoryQueueService};
pub use store::{MemoryObjectStore, MemoryStoreError};
