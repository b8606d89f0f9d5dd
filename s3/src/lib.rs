pub mod progress;
pub mod s3_client;
pub mod service;
pub mod signature;
pub mod types;

pub use s3_client::{S3Client, S3ClientConfig};
pub use service::ObjectService;
