use std::fs::File;
use log::{debug, info, warn};

use crate::progress::{self, ProgressListener};
use crate::service::ObjectService;
use crate::signature::{AwsCredentials, Payload, SignVersion, SignedRequest};
use crate::types::{AppendObjectInput, AppendS3ObjectResp, ErrorResp, ListCloudBoxResult, S3ObjectInfo};

use common::error::Errno;
use common::http_client::{HttpBody, HttpClient, HttpMethod, RespText, TransportOptions};
use common::runtime::Executor;

pub const NEXT_APPEND_POSITION: &str = "x-amz-next-append-position";
const SERVICE: &str = "s3";

#[derive(Debug, Clone)]
pub struct S3ClientConfig {
    // host[:port], optionally prefixed by http:// or https://
    pub endpoint: String,
    pub region: String,
    pub credentials: AwsCredentials,
    pub sign_version: SignVersion,
    // timeouts, proxy and certificate checks.
    pub transport: TransportOptions,
    pub user_agent: String,
    // attempts of buffered requests, streamed uploads are sent once.
    pub retry_times: u32,
}

pub struct S3Client {
    // region
    pub region: String,
    // endpoint, without scheme
    pub endpoint: String,
    // http or https
    pub scheme: String,
    credentials: AwsCredentials,
    sign_version: SignVersion,
    user_agent: String,
    http_client: HttpClient,
}

// splits "https://host:port/" into ("https", "host:port").
pub fn parse_endpoint(endpoint: &str) -> Result<(String, String), Errno> {
    let endpoint = endpoint.trim();
    let (scheme, host) = if let Some(host) = endpoint.strip_prefix("https://") {
        ("https", host)
    } else if let Some(host) = endpoint.strip_prefix("http://") {
        ("http", host)
    } else {
        ("http", endpoint)
    };
    let host = host.trim_end_matches('/');
    if host.is_empty() || host.contains('/') {
        return Err(Errno::Econfig(format!("invalid endpoint: {}", endpoint)));
    }
    Ok((scheme.to_string(), host.to_string()))
}

impl S3Client {
    pub fn new(cfg: S3ClientConfig) -> Result<S3Client, Errno> {
        let (scheme, endpoint) = parse_endpoint(&cfg.endpoint)?;
        let exec = Executor::create_single_threaded()?;
        let http_client = HttpClient::with_transport(cfg.retry_times.max(1), &cfg.transport, &exec)?;
        Ok(S3Client {
            region: cfg.region,
            endpoint: endpoint,
            scheme: scheme,
            credentials: cfg.credentials,
            sign_version: cfg.sign_version,
            user_agent: cfg.user_agent,
            http_client: http_client,
        })
    }

    fn object_path(bucket: &str, object: &str) -> String {
        format!("/{}/{}", bucket, object)
    }

    fn new_request(&self, method: &str, path: &str) -> SignedRequest {
        SignedRequest::new(method, SERVICE, &self.region, path, &self.endpoint)
    }

    // signs the request and sends it, retried by the http client unless the body is a stream.
    fn send(&self, mut request: SignedRequest, payload: Payload, body: HttpBody, method: HttpMethod) -> Result<RespText, Errno> {
        request.sign(self.sign_version, &self.credentials, &payload);
        if !self.user_agent.is_empty() {
            request.add_header("user-agent", &self.user_agent);
        }
        let url = format!("{}://{}{}", self.scheme, self.endpoint, request.path_and_query());
        debug!("{:?} {}", method, url);

        let resp = self.http_client.request_with_headers(&url, &request.headers, body, &method)?;
        debug!("{:?} {} got status {}", method, url, resp.status);
        Ok(resp)
    }

    fn next_position(resp: &RespText) -> Result<u64, Errno> {
        match resp.header(NEXT_APPEND_POSITION) {
            Some(position) => {
                position.trim().parse::<u64>()
                    .map_err(|err| Errno::Eparse(format!("invalid {}: {}, err: {}", NEXT_APPEND_POSITION, position, err)))
            }
            None => {
                Err(Errno::Eparse(format!("{} is missing in the response", NEXT_APPEND_POSITION)))
            }
        }
    }

    /// Converts a failed response into an error.
    pub fn response_error(resp: &RespText, resource: &str) -> Errno {
        let detail = ErrorResp::from_xml(&resp.body).unwrap_or_default();
        if resp.status == 404 {
            return Errno::Enotf(resource.to_string());
        }
        if resp.status == 403 {
            let message = if detail.message.is_empty() { resp.body.clone() } else { detail.message };
            return Errno::Eaccess(format!("{}, {}", resource, message));
        }
        let request_id = if detail.request_id.is_empty() {
            resp.header("x-amz-request-id").cloned().unwrap_or_default()
        } else {
            detail.request_id
        };
        let message = if detail.message.is_empty() && detail.code.is_empty() {
            resp.body.clone()
        } else {
            detail.message
        };
        Errno::Eservice {
            status: resp.status,
            code: detail.code,
            message: message,
            request_id: request_id,
        }
    }
}

impl ObjectService for S3Client {
    fn head_object(&self, bucket: &str, object: &str) -> Result<S3ObjectInfo, Errno>{
        let path = S3Client::object_path(bucket, object);
        let request = self.new_request("HEAD", &path);
        let resp = self.send(request, Payload::Buffer(&[]), HttpBody::Empty, HttpMethod::Head)?;
        if resp.status >= 300 {
            return Err(S3Client::response_error(&resp, &path));
        }

        match resp.header("content-length") {
            Some(size) => {
                let size = size.trim().parse::<u64>()
                    .map_err(|err| Errno::Eparse(format!("invalid content-length: {}, err: {}", size, err)))?;
                Ok(S3ObjectInfo {
                    bucket: bucket.to_string(),
                    name: object.to_string(),
                    size: size,
                })
            }
            None => {
                Err(Errno::Eparse(format!("content-length of {} is missing", path)))
            }
        }
    }

    fn append_object_from_file(&self,
        input: &AppendObjectInput,
        listener: Option<Box<dyn ProgressListener>>) -> Result<AppendS3ObjectResp, Errno> {
        let f = File::open(&input.file_path)?;
        let size = f.metadata()?.len();

        let path = S3Client::object_path(&input.bucket, &input.object);
        let mut request = self.new_request("POST", &path);
        let position = input.position.to_string();
        request.add_param("append", "");
        request.add_param("position", position.as_str());
        for (key, value) in input.headers.iter() {
            request.add_header(key, value);
        }
        request.add_header("content-length", &size.to_string());

        info!("append {} bytes from {:?} to {} at position {}", size, input.file_path, path, input.position);
        let body = progress::file_body(f, size, listener, input.max_speed);
        let resp = self.send(request, Payload::Unsigned, HttpBody::Stream(body), HttpMethod::Post)?;
        if resp.status == 409 {
            if let Ok(next) = S3Client::next_position(&resp) {
                warn!("position {} of {} does not match the object length {}", input.position, path, next);
                return Err(Errno::Eoffset(next));
            }
        }
        if resp.status >= 300 {
            return Err(S3Client::response_error(&resp, &path));
        }

        Ok(AppendS3ObjectResp {
            bucket: input.bucket.clone(),
            name: input.object.clone(),
            next_append_position: S3Client::next_position(&resp)?,
        })
    }

    fn list_cloud_boxes(&self, prefix: &str, marker: &str, max_keys: Option<u32>) -> Result<ListCloudBoxResult, Errno> {
        let mut request = self.new_request("GET", "/");
        request.add_param("cloudboxes", "");
        if !prefix.is_empty() {
            request.add_param("prefix", prefix);
        }
        if !marker.is_empty() {
            request.add_param("marker", marker);
        }
        let max_keys = max_keys.map(|n| n.to_string());
        if let Some(max_keys) = max_keys.as_ref() {
            request.add_param("max-keys", max_keys.as_str());
        }

        let resp = self.send(request, Payload::Buffer(&[]), HttpBody::Empty, HttpMethod::Get)?;
        if resp.status >= 300 {
            return Err(S3Client::response_error(&resp, "cloudboxes"));
        }
        ListCloudBoxResult::from_xml(&resp.body)
    }
}
