extern crate hyper;
extern crate tokio;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use bytes::Bytes;
use headers::Authorization;
use http::header::{HeaderMap, HeaderName, HeaderValue, PROXY_AUTHORIZATION};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Uri};
use hyper_proxy::{Intercept, Proxy, ProxyConnector};
use hyper_tls::HttpsConnector;
use log::{debug, warn};

use crate::error::Errno;
use crate::runtime::Executor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpMethod{
    Get,
    Put,
    Post,
    Delete,
    Head,
}

#[derive (Debug, Default)]
pub struct RespText{
    pub status: u16,
    // header names are lower case.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RespText {
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_ascii_lowercase())
    }
}

pub enum HttpBody {
    Empty,
    Buffer(Bytes),
    // a stream can only be consumed once, so it is never retried.
    Stream(Body),
}

impl HttpBody {
    pub fn is_stream(&self) -> bool {
        matches!(self, HttpBody::Stream(_))
    }

    fn take_for_attempt(&mut self) -> Body {
        match self {
            HttpBody::Empty => Body::empty(),
            HttpBody::Buffer(data) => Body::from(data.clone()),
            HttpBody::Stream(body) => std::mem::replace(body, Body::empty()),
        }
    }
}

/// Connection level settings shared by every request of a client.
#[derive(Clone, Default)]
pub struct TransportOptions {
    pub connect_timeout: Option<Duration>,
    // not applied to streamed bodies.
    pub read_timeout: Option<Duration>,
    // host[:port], optionally prefixed by http://, empty means no proxy.
    pub proxy_host: String,
    pub proxy_user: String,
    pub proxy_pwd: String,
    pub skip_verify_cert: bool,
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("proxy_host", &self.proxy_host)
            .field("proxy_user", &self.proxy_user)
            .field("proxy_pwd", &"**********")
            .field("skip_verify_cert", &self.skip_verify_cert)
            .finish()
    }
}

pub fn parse_proxy_uri(host: &str) -> Result<Uri, Errno> {
    let host = host.trim();
    let url = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    match url.parse::<Uri>() {
        Ok(uri) if uri.host().is_some() => Ok(uri),
        Ok(_) => Err(Errno::Econfig(format!("invalid proxy host: {}", host))),
        Err(err) => Err(Errno::Econfig(format!("invalid proxy host: {}, err: {}", host, err))),
    }
}

type Connector = ProxyConnector<HttpsConnector<HttpConnector>>;

// returns the connector and the headers plain http requests carry for the proxy.
fn build_connector(opts: &TransportOptions) -> Result<(Connector, HeaderMap), Errno> {
    let tls = match native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(opts.skip_verify_cert)
        .build() {
        Ok(tls) => tls,
        Err(err) => {
            return Err(Errno::Econfig(format!("failed to create tls connector, err: {}", err)));
        }
    };
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(opts.connect_timeout);
    let tls_connector: tokio_native_tls::TlsConnector = tls.clone().into();
    let https = HttpsConnector::from((http, tls_connector));

    let mut connector = ProxyConnector::unsecured(https);
    if opts.proxy_host.trim().is_empty() {
        return Ok((connector, HeaderMap::new()));
    }
    let mut proxy = Proxy::new(Intercept::All, parse_proxy_uri(&opts.proxy_host)?);
    if !opts.proxy_user.is_empty() {
        proxy.set_authorization(Authorization::basic(&opts.proxy_user, &opts.proxy_pwd));
    }
    debug!("send requests through proxy {}, user: {}", opts.proxy_host, opts.proxy_user);
    // the request keeps its own authorization header.
    let mut headers = HeaderMap::new();
    if let Some(value) = proxy.headers().get(PROXY_AUTHORIZATION) {
        headers.insert(PROXY_AUTHORIZATION, value.clone());
    }
    // tunneled https targets are wrapped with the same tls settings.
    connector.set_tls(Some(tls));
    connector.add_proxy(proxy);
    Ok((connector, headers))
}

pub struct HttpClient{
    pub retry_times: u32,
    read_timeout: Option<Duration>,
    headers: BTreeMap<String, Vec<Vec<u8>>>,
    proxy_headers: HeaderMap,
    http_client: Client<Connector, Body>,
    exec: Executor,
}

impl HttpClient{
    pub fn new(retry_times: u32, exec: &Executor) -> Result<HttpClient, Errno>{
        HttpClient::with_transport(retry_times, &TransportOptions::default(), exec)
    }

    pub fn with_transport(retry_times: u32, opts: &TransportOptions, exec: &Executor) -> Result<HttpClient, Errno>{
        let (connector, proxy_headers) = build_connector(opts)?;
        Ok(HttpClient{
            retry_times: retry_times,
            read_timeout: opts.read_timeout,
            headers: BTreeMap::new(),
            proxy_headers: proxy_headers,
            http_client: Client::builder().build::<_, Body>(connector),
            exec: exec.clone(),
        })
    }

    pub fn set_headers(&mut self, headers: BTreeMap<String, Vec<Vec<u8>>>) {
        self.headers = headers;
    }

    // blocks the caller until the response body is fully read.
    pub fn request(&self, url: &str, body: HttpBody, method: &HttpMethod) -> Result<RespText, Errno>{
        self.request_with_headers(url, &self.headers, body, method)
    }

    pub fn request_with_headers(&self,
        url: &str,
        headers: &BTreeMap<String, Vec<Vec<u8>>>,
        body: HttpBody,
        method: &HttpMethod) -> Result<RespText, Errno>{
        let mut body = body;
        let bounded = !body.is_stream();
        let retry_times = if body.is_stream() { 1 } else { self.retry_times.max(1) };
        let mut count = 0;
        let mut last_err = String::new();
        while count < retry_times {
            count += 1;
            let req = self.build_request(url, headers, method, body.take_for_attempt())?;
            debug!("send {:?} request to url: {}, attempt: {}", method, url, count);
            let result = self.exec.get_runtime().block_on(self.send(req, bounded));
            match result {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(error) => {
                    warn!("failed to send request to url: {}, err: {} in {} time", url, error, count);
                    last_err = error;
                }
            }
        }

        Err(Errno::Ehttp(format!("failed to send request to url {} in {} times, err: {}",
            url, retry_times, last_err)))
    }

    fn build_request(&self,
        url: &str,
        headers: &BTreeMap<String, Vec<Vec<u8>>>,
        method: &HttpMethod,
        body: Body) -> Result<Request<Body>, Errno> {
        let mut req = Request::builder()
            .method(self.get_http_method(method))
            .uri(url)
            .body(body)
            .map_err(|err| Errno::Einval(format!("failed to create request from url: {}, err: {}", url, err)))?;
        // https targets get the proxy headers on the CONNECT request instead.
        if req.uri().scheme_str() == Some("http") {
            for (key, value) in self.proxy_headers.iter() {
                req.headers_mut().insert(key, value.clone());
            }
        }
        for (key, values) in headers.iter() {
            let header_name = match key.parse::<HeaderName>() {
                Ok(name) => name,
                Err(err) => {
                    return Err(Errno::Einval(format!("error parsing header name {}: {}", key, err)));
                }
            };
            for v in values.iter() {
                let header_value = match HeaderValue::from_bytes(v) {
                    Ok(value) => value,
                    Err(err) => {
                        return Err(Errno::Einval(format!("error parsing header value of {}: {}", key, err)));
                    }
                };
                req.headers_mut().append(&header_name, header_value);
            }
        }
        Ok(req)
    }

    fn get_http_method(&self, m: &HttpMethod) -> hyper::Method {
        match m {
            HttpMethod::Put => {
                hyper::Method::PUT
            }
            HttpMethod::Post => {
                hyper::Method::POST
            }
            HttpMethod::Delete => {
                hyper::Method::DELETE
            }
            HttpMethod::Head => {
                hyper::Method::HEAD
            }
            HttpMethod::Get => {
                hyper::Method::GET
            }
        }
    }

    async fn send(&self, req: Request<Body>, bounded: bool) -> Result<RespText, String> {
        match self.read_timeout {
            Some(timeout) if bounded => {
                match tokio::time::timeout(timeout, self.exchange(req)).await {
                    Ok(ret) => ret,
                    Err(_) => Err(format!("no response in {:?}", timeout)),
                }
            }
            _ => self.exchange(req).await,
        }
    }

    async fn exchange(&self, req: Request<Body>) -> Result<RespText, String>{
        let resp = match self.http_client.request(req).await {
            Ok(resp) => resp,
            Err(error) => {
                return Err(format!("http request is failed with err: {}", error));
            }
        };
        let status = resp.status().as_u16();
        let mut headers = HashMap::new();
        for (h, v) in resp.headers(){
            match std::str::from_utf8(v.as_bytes()) {
                Ok(v) => {
                    headers.insert(String::from(h.as_str()), String::from(v));
                }
                Err(error) =>{
                    warn!("got invalid header {} with error: {}", h.as_str(), error);
                }
            }
        }
        let body = match hyper::body::to_bytes(resp.into_body()).await {
            Ok(body) => body,
            Err(error) => {
                return Err(format!("failed to get body, err: {}", error));
            }
        };
        Ok(RespText{
            status: status,
            headers: headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
