use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use common::error::Errno;
use objcli::client_factory::ClientFactory;
use s3::progress::ProgressListener;
use s3::types::{AppendObjectInput, AppendS3ObjectResp, CloudBox, ListCloudBoxResult, S3ObjectInfo};
use s3::ObjectService;

#[derive(Debug, Default)]
pub struct FakeState {
    // "bucket/object" -> length
    pub objects: BTreeMap<String, u64>,
    pub metas: BTreeMap<String, Vec<(String, String)>>,
    pub cloud_boxes: Vec<CloudBox>,
    pub page_size: usize,
    // the next list calls that fail before one succeeds.
    pub list_failures: usize,
    // pages served before list_failures kicks in.
    pub list_fail_after: usize,
    pub list_pages: usize,
    pub creates: usize,
    // "head bucket/object", "append bucket/object@pos", "list prefix|marker"
    pub calls: Vec<String>,
}

impl FakeState {
    pub fn with_cloud_boxes(count: usize, page_size: usize) -> FakeState {
        let mut state = FakeState::default();
        state.page_size = page_size;
        for i in 0..count {
            state.cloud_boxes.push(CloudBox {
                id: format!("cb-{:04}", i),
                name: format!("box-{:04}", i),
                owner: "owner".to_string(),
                region: "cn-bj-1".to_string(),
                control_endpoint: "control.test.com".to_string(),
                data_endpoint: "data.test.com".to_string(),
            });
        }
        state
    }

    pub fn calls_of(&self, kind: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(kind)).count()
    }
}

pub struct FakeService {
    state: Rc<RefCell<FakeState>>,
}

impl ObjectService for FakeService {
    fn head_object(&self, bucket: &str, object: &str) -> Result<S3ObjectInfo, Errno> {
        let key = format!("{}/{}", bucket, object);
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("head {}", key));
        match state.objects.get(&key) {
            Some(size) => Ok(S3ObjectInfo {
                bucket: bucket.to_string(),
                name: object.to_string(),
                size: *size,
            }),
            None => Err(Errno::Enotf(key)),
        }
    }

    fn is_object_exist(&self, bucket: &str, object: &str) -> Result<bool, Errno> {
        let key = format!("{}/{}", bucket, object);
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("exist {}", key));
        Ok(state.objects.contains_key(&key))
    }

    fn append_object_from_file(&self,
        input: &AppendObjectInput,
        _listener: Option<Box<dyn ProgressListener>>) -> Result<AppendS3ObjectResp, Errno> {
        let key = format!("{}/{}", input.bucket, input.object);
        let size = std::fs::metadata(&input.file_path)?.len();
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("append {}@{}", key, input.position));
        let current = state.objects.get(&key).cloned().unwrap_or(0);
        if current != input.position {
            return Err(Errno::Eoffset(current));
        }
        if !input.headers.is_empty() {
            state.metas.insert(key.clone(), input.headers.clone());
        }
        state.objects.insert(key, current + size);
        Ok(AppendS3ObjectResp {
            bucket: input.bucket.clone(),
            name: input.object.clone(),
            next_append_position: current + size,
        })
    }

    fn list_cloud_boxes(&self, prefix: &str, marker: &str, _max_keys: Option<u32>) -> Result<ListCloudBoxResult, Errno> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("list {}|{}", prefix, marker));
        if state.list_failures > 0 && state.list_pages >= state.list_fail_after {
            state.list_failures -= 1;
            return Err(Errno::Ehttp(format!("list failure, {} left", state.list_failures)));
        }

        let page_size = if state.page_size == 0 { 1000 } else { state.page_size };
        let matched: Vec<CloudBox> = state.cloud_boxes.iter()
            .filter(|b| b.name.starts_with(prefix) && b.name.as_str() > marker)
            .cloned()
            .collect();
        let is_truncated = matched.len() > page_size;
        state.list_pages += 1;
        let cloud_boxes: Vec<CloudBox> = matched.into_iter().take(page_size).collect();
        let next_marker = if is_truncated {
            cloud_boxes.last().map(|b| b.name.clone()).unwrap_or_default()
        } else {
            String::new()
        };
        Ok(ListCloudBoxResult {
            prefix: prefix.to_string(),
            marker: marker.to_string(),
            max_keys: page_size as i64,
            is_truncated: is_truncated,
            next_marker: next_marker,
            cloud_boxes: cloud_boxes,
        })
    }
}

pub struct FakeFactory {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeFactory {
    pub fn new(state: FakeState) -> Rc<FakeFactory> {
        Rc::new(FakeFactory {
            state: Rc::new(RefCell::new(state)),
        })
    }
}

impl ClientFactory for FakeFactory {
    fn create(&self) -> Result<Box<dyn ObjectService>, Errno> {
        self.state.borrow_mut().creates += 1;
        Ok(Box::new(FakeService {
            state: self.state.clone(),
        }))
    }
}
