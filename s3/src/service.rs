use common::error::Errno;

use crate::progress::ProgressListener;
use crate::types::{AppendObjectInput, AppendS3ObjectResp, ListCloudBoxResult, S3ObjectInfo};

/// The service operations the commands are built on.
pub trait ObjectService {
    fn head_object(&self, bucket: &str, object: &str) -> Result<S3ObjectInfo, Errno>;

    fn is_object_exist(&self, bucket: &str, object: &str) -> Result<bool, Errno> {
        match self.head_object(bucket, object) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Appends the whole file at `input.position`, sent exactly once.
    fn append_object_from_file(&self,
        input: &AppendObjectInput,
        listener: Option<Box<dyn ProgressListener>>) -> Result<AppendS3ObjectResp, Errno>;

    /// Fetches one page of cloud boxes, empty prefix and marker are not sent.
    fn list_cloud_boxes(&self, prefix: &str, marker: &str, max_keys: Option<u32>) -> Result<ListCloudBoxResult, Errno>;
}
