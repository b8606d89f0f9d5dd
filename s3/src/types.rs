use std::path::PathBuf;
use serde_derive::Deserialize;

use common::error::Errno;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct S3ObjectInfo {
    pub bucket: String,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AppendS3ObjectResp {
    pub bucket: String,
    pub name: String,
    pub next_append_position: u64,
}

#[derive(Debug, Default, Clone)]
pub struct AppendObjectInput {
    pub bucket: String,
    pub object: String,
    pub position: u64,
    pub file_path: PathBuf,
    // extra request headers, user metadata included.
    pub headers: Vec<(String, String)>,
    // KB/s, 0 means unlimited.
    pub max_speed: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudBox {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub control_endpoint: String,
    #[serde(default)]
    pub data_endpoint: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListCloudBoxResult {
    pub prefix: String,
    pub marker: String,
    pub max_keys: i64,
    pub is_truncated: bool,
    pub next_marker: String,
    pub cloud_boxes: Vec<CloudBox>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListCloudBoxResponse {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    marker: String,
    #[serde(default)]
    max_keys: i64,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_marker: String,
    #[serde(default)]
    cloud_boxes: CloudBoxes,
}

#[derive(Debug, Default, Deserialize)]
struct CloudBoxes {
    #[serde(rename = "CloudBox", default)]
    cloud_box: Vec<CloudBox>,
}

impl From<ListCloudBoxResponse> for ListCloudBoxResult {
    fn from(value: ListCloudBoxResponse) -> Self {
        ListCloudBoxResult {
            prefix: value.prefix,
            marker: value.marker,
            max_keys: value.max_keys,
            is_truncated: value.is_truncated,
            next_marker: value.next_marker,
            cloud_boxes: value.cloud_boxes.cloud_box,
        }
    }
}

impl ListCloudBoxResult {
    pub fn from_xml(body: &str) -> Result<ListCloudBoxResult, Errno> {
        let resp: ListCloudBoxResponse = quick_xml::de::from_str(body)
            .map_err(|err| Errno::Eparse(format!("invalid list cloud box response, err: {}", err)))?;
        Ok(resp.into())
    }
}

/// Error body returned by the service.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResp {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub host_id: String,
}

impl ErrorResp {
    pub fn from_xml(body: &str) -> Option<ErrorResp> {
        if body.trim().is_empty() {
            return None;
        }
        quick_xml::de::from_str(body).ok()
    }
}
