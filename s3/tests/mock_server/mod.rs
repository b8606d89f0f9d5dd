use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server};
use percent_encoding::percent_decode_str;

pub const DENIED_KEY: &str = "denied";

#[derive(Debug, Clone)]
pub struct MockCloudBox {
    pub id: String,
    pub name: String,
}

#[derive(Default)]
pub struct MockState {
    // "/bucket/object" -> content
    pub objects: HashMap<String, Vec<u8>>,
    pub metas: HashMap<String, Vec<(String, String)>>,
    pub cloud_boxes: Vec<MockCloudBox>,
    pub page_size: usize,
    // "METHOD /path?query"
    pub requests: Vec<String>,
    pub auth_headers: Vec<String>,
}

impl MockState {
    pub fn with_cloud_boxes(count: usize, page_size: usize) -> MockState {
        let mut state = MockState::default();
        state.page_size = page_size;
        for i in 0..count {
            state.cloud_boxes.push(MockCloudBox {
                id: format!("cb-{:04}", i),
                name: format!("{}-box-{}", if i % 2 == 0 { "even" } else { "odd" }, i),
            });
        }
        state
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub fn start(state: MockState) -> MockServer {
        let state = Arc::new(Mutex::new(state));
        let server_state = state.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let make_svc = make_service_fn(move |_conn| {
                    let state = server_state.clone();
                    async move {
                        Ok::<_, Infallible>(service_fn(move |req| handle(req, state.clone())))
                    }
                });
                let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
                tx.send(server.local_addr()).unwrap();
                let _ = server.await;
            });
        });
        let addr = rx.recv().unwrap();
        MockServer { addr: addr, state: state }
    }

    pub fn endpoint(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or_default();
        let value = kv.next().unwrap_or_default();
        params.insert(
            percent_decode_str(key).decode_utf8_lossy().into_owned(),
            percent_decode_str(value).decode_utf8_lossy().into_owned(),
        );
    }
    params
}

fn error_response(status: u16, code: &str, message: &str) -> Response<Body> {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{}</Code><Message>{}</Message><RequestId>req-{}</RequestId><HostId>mock</HostId></Error>",
        code, message, status
    );
    Response::builder()
        .status(status)
        .header("x-amz-request-id", format!("req-{}", status))
        .body(Body::from(body))
        .unwrap()
}

fn list_cloud_boxes(state: &MockState, query: &HashMap<String, String>) -> Response<Body> {
    let prefix = query.get("prefix").cloned().unwrap_or_default();
    let marker = query.get("marker").cloned().unwrap_or_default();
    let page_size = query
        .get("max-keys")
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(state.page_size);
    let matched: Vec<&MockCloudBox> = state
        .cloud_boxes
        .iter()
        .filter(|b| b.name.starts_with(&prefix))
        .filter(|b| marker.is_empty() || b.id.as_str() > marker.as_str())
        .collect();
    let page: Vec<&MockCloudBox> = matched.iter().take(page_size).cloned().collect();
    let truncated = matched.len() > page.len();
    let next_marker = if truncated {
        page.last().map(|b| b.id.clone()).unwrap_or_default()
    } else {
        String::new()
    };
    let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ListCloudBoxResult>");
    body.push_str(&format!(
        "<Prefix>{}</Prefix><Marker>{}</Marker><MaxKeys>{}</MaxKeys><IsTruncated>{}</IsTruncated><NextMarker>{}</NextMarker>",
        prefix, marker, page_size, truncated, next_marker
    ));
    body.push_str("<Owner><ID>owner-1</ID><DisplayName>owner-1</DisplayName></Owner><CloudBoxes>");
    for b in page {
        body.push_str(&format!(
            "<CloudBox><ID>{}</ID><Name>{}</Name><Owner>owner-1</Owner><Region>cn-bj-1</Region><ControlEndpoint>{}.control.test.com</ControlEndpoint><DataEndpoint>{}.data.test.com</DataEndpoint></CloudBox>",
            b.id, b.name, b.id, b.id
        ));
    }
    body.push_str("</CloudBoxes></ListCloudBoxResult>");
    Response::new(Body::from(body))
}

async fn handle(req: Request<Body>, state: Arc<Mutex<MockState>>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = percent_decode_str(req.uri().path()).decode_utf8_lossy().into_owned();
    let raw_query = req.uri().query().unwrap_or_default().to_string();
    let query = parse_query(&raw_query);
    let headers = req.headers().clone();
    let body = hyper::body::to_bytes(req.into_body()).await.unwrap_or_default();

    let mut state = state.lock().unwrap();
    state.requests.push(format!("{} {}?{}", method, path, raw_query));
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.auth_headers.push(auth.clone());
    if auth.is_empty() || auth.contains(DENIED_KEY) {
        return Ok(error_response(403, "AccessDenied", "Access Denied"));
    }

    let resp = if method == Method::HEAD {
        match state.objects.get(&path) {
            // hyper derives content-length from the body and drops the body for HEAD.
            Some(content) => Response::new(Body::from(content.clone())),
            None => error_response(404, "NoSuchKey", "The specified key does not exist."),
        }
    } else if method == Method::POST && query.contains_key("append") {
        let position = query
            .get("position")
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(usize::MAX);
        let current = state.objects.get(&path).map(|o| o.len()).unwrap_or(0);
        if position != current {
            Response::builder()
                .status(409)
                .header("x-amz-next-append-position", current.to_string())
                .body(Body::from(
                    "<Error><Code>PositionNotEqualToLength</Code><Message>Position is not equal to file length</Message></Error>",
                ))
                .unwrap()
        } else {
            if !state.objects.contains_key(&path) {
                let metas: Vec<(String, String)> = headers
                    .iter()
                    .filter(|(k, _)| k.as_str().starts_with("x-amz-meta-"))
                    .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect();
                state.metas.insert(path.clone(), metas);
            }
            let object = state.objects.entry(path.clone()).or_default();
            object.extend_from_slice(&body);
            let next = object.len();
            Response::builder()
                .status(200)
                .header("x-amz-next-append-position", next.to_string())
                .body(Body::empty())
                .unwrap()
        }
    } else if method == Method::GET && path == "/" && query.contains_key("cloudboxes") {
        list_cloud_boxes(&state, &query)
    } else {
        error_response(400, "InvalidRequest", "unsupported request")
    };
    Ok(resp)
}

pub fn new_client(server: &MockServer, ak: &str, version: s3::signature::SignVersion) -> s3::S3Client {
    let cfg = s3::S3ClientConfig {
        endpoint: format!("http://{}/", server.endpoint()),
        region: "cn-bj-1".to_string(),
        credentials: s3::signature::AwsCredentials::new(ak, "hehehehe"),
        sign_version: version,
        transport: common::http_client::TransportOptions {
            connect_timeout: Some(std::time::Duration::from_secs(5)),
            read_timeout: Some(std::time::Duration::from_secs(30)),
            ..Default::default()
        },
        user_agent: "objcli-test".to_string(),
        retry_times: 1,
    };
    s3::S3Client::new(cfg).unwrap()
}
