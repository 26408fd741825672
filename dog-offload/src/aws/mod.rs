//! AWS-backed collaborators, enabled with the `aws` feature

mod s3;
mod sqs;

pub use s3::S3ObjectStore;
pub use sqs::SqsQueueService;
