use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use chrono::{DateTime, Utc, NaiveDate};
use digest::Digest;
use hex;
use hmac::{Hmac, Mac, NewMac};
use md5::Md5;
use base64;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use sha2::Sha256;

use common::error::Errno;


/// Payload string to use for signed empty payload
pub static EMPTY_SHA256_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Payload string to use for unsigned payload
pub static UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Sub-resources that take part in the V2 canonical resource.
const V2_SUB_RESOURCES: [&str; 4] = ["append", "cloudboxes", "position", "uploadId"];

/// Do not URI-encode any of the unreserved characters that RFC 3986 defines:
/// A-Z, a-z, 0-9, hyphen ( - ), underscore ( _ ), period ( . ), and tilde ( ~ ).
/// Percent-encode all other characters with %XY, where X and Y are hexadecimal
/// characters (0-9 and uppercase A-F). For example, the space character must be
/// encoded as %20 (not using '+', as some encoding schemes do) and extended UTF-8
/// characters must be in the form %XY%ZA%BC
/// This constant is used to maintain the strict URI encoding standard as proposed by RFC 3986
pub const STRICT_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// This struct is used to maintain the URI path encoding
pub const STRICT_PATH_ENCODE_SET: AsciiSet = STRICT_ENCODE_SET.remove(b'/');

pub type Params = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignVersion {
    V2,
    V4,
}

impl SignVersion {
    pub fn parse(version: &str) -> Result<SignVersion, Errno> {
        match version.trim().to_ascii_lowercase().as_str() {
            "" | "v4" => Ok(SignVersion::V4),
            "v2" => Ok(SignVersion::V2),
            _ => Err(Errno::Einval(format!("invalid sign version: {}, should be v2 or v4", version))),
        }
    }
}

/// What is hashed into the signature.
pub enum Payload<'a> {
    Buffer(&'a [u8]),
    // body is streamed, its hash is not known up front.
    Unsigned,
}

#[derive(Clone, Default)]
pub struct AwsCredentials {
    pub key: String,
    pub secret: String,
    pub token: Option<String>,
}

impl AwsCredentials {
    /// Create a new `AwsCredentials` from a key ID and a secret key
    pub fn new(key: &str, secret: &str) -> AwsCredentials {
        AwsCredentials {
            key: key.to_string(),
            secret: secret.to_string(),
            token: None,
        }
    }

    /// Attach a temporary security token, empty tokens are ignored.
    pub fn with_token(mut self, token: &str) -> AwsCredentials {
        if !token.is_empty() {
            self.token = Some(token.to_string());
        }
        self
    }

    /// Get a reference to the access key ID.
    pub fn aws_access_key_id(&self) -> &str {
        &self.key
    }

    /// Get a reference to the secret access key.
    pub fn aws_secret_access_key(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("key", &self.key)
            .field("secret", &"******")
            .field("token", &self.token.as_ref().map(|_| "******"))
            .finish()
    }
}

#[inline]
#[doc(hidden)]
pub fn encode_uri_path(uri: &str) -> String {
    utf8_percent_encode(uri, &STRICT_PATH_ENCODE_SET).collect::<String>()
}

#[inline]
pub fn encode_uri_strict(uri: &str) -> String {
    utf8_percent_encode(uri, &STRICT_ENCODE_SET).collect::<String>()
}

/// Canonicalizes query while iterating through the given paramaters
///
/// Read more about it: [HERE](http://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html#query-string-auth-v4-signing)
fn build_canonical_query_string(params: &Params) -> String {
    if params.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    for (key, val) in params.iter() {
        if !output.is_empty() {
            output.push_str("&");
        }
        output.push_str(&encode_uri_strict(&key));
        output.push_str("=");

        if let Some(ref unwrapped_val) = *val {
            output.push_str(&encode_uri_strict(&unwrapped_val));
        }
    }

    output
}

/// The query string sent on the wire, `key` alone for empty values.
pub fn build_query_string(params: &Params) -> String {
    let mut output = String::new();
    for (key, val) in params.iter() {
        if !output.is_empty() {
            output.push('&');
        }
        output.push_str(&encode_uri_strict(key));
        match val {
            Some(v) if !v.is_empty() => {
                output.push('=');
                output.push_str(&encode_uri_strict(v));
            }
            _ => {}
        }
    }
    output
}

fn to_hexdigest<T: AsRef<[u8]>>(t: T) -> String {
    let h = Sha256::digest(t.as_ref());
    hex::encode(h)
}

fn skipped_headers(header: &str) -> bool {
    ["authorization", "content-length", "user-agent"].contains(&header)
}

fn signed_headers(headers: &BTreeMap<String, Vec<Vec<u8>>>) -> String {
    let mut signed = String::new();
    headers
        .iter()
        .filter(|&(ref key, _)| !skipped_headers(&key))
        .for_each(|(key, _)| {
            if !signed.is_empty() {
                signed.push(';');
            }
            signed.push_str(key);
        });
    signed
}

/// Canonicalizes values into the AWS Canonical Form.
///
/// Read more about it: [HERE](http://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html)
fn canonical_values(values: &[Vec<u8>]) -> String {
    let mut st = String::new();
    for v in values {
        let s = String::from_utf8_lossy(v);
        if !st.is_empty() {
            st.push(',')
        }
        if s.starts_with('\"') {
            st.push_str(&s);
        } else {
            st.push_str(s.replace("  ", " ").trim());
        }
    }
    st
}

/// Canonicalizes headers into the AWS Canonical Form.
///
/// Read more about it: [HERE](http://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html)
fn canonical_headers(headers: &BTreeMap<String, Vec<Vec<u8>>>) -> String {
    let mut canonical = String::new();

    for (key, value) in headers.iter() {
        if skipped_headers(key) {
            continue;
        }
        canonical.push_str(format!("{}:{}\n", key, canonical_values(value)).as_ref());
    }
    canonical
}

#[inline]
fn hmac(secret: &[u8], message: &[u8]) -> Hmac<Sha256> {
    let mut hmac = Hmac::<Sha256>::new_varkey(secret).expect("hmac takes keys of any size");
    hmac.update(message);
    hmac
}

/// Mark string as AWS4-HMAC-SHA256 hashed
pub fn string_to_sign(date: DateTime<Utc>, hashed_canonical_request: &str, scope: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        date.format("%Y%m%dT%H%M%SZ"),
        scope,
        hashed_canonical_request
    )
}

/// Derives the V4 signing key from the secret, date, region and service.
pub fn signing_key(secret: &str, date: NaiveDate, region: &str, service: &str) -> Vec<u8> {
    let date_str = date.format("%Y%m%d").to_string();
    let date_hmac = hmac(format!("AWS4{}", secret).as_bytes(), date_str.as_bytes())
        .finalize()
        .into_bytes();
    let region_hmac = hmac(date_hmac.as_ref(), region.as_bytes())
        .finalize()
        .into_bytes();
    let service_hmac = hmac(region_hmac.as_ref(), service.as_bytes())
        .finalize()
        .into_bytes();
    hmac(service_hmac.as_ref(), b"aws4_request")
        .finalize()
        .into_bytes()
        .to_vec()
}

/// Takes a message and signs it using AWS secret, time, region keys and service keys.
fn sign_string (
    string_to_sign: &str,
    secret: &str,
    date: NaiveDate,
    region: &str,
    service: &str,
) -> String {
    let signing_hmac = signing_key(secret, date, region, service);
    hex::encode(
        hmac(&signing_hmac, string_to_sign.as_bytes())
            .finalize()
            .into_bytes(),
    )
}

/// Base64 encoded HMAC-SHA1 of the V2 string to sign.
pub fn sign_string_v2(string_to_sign: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha1>::new_varkey(secret.as_bytes()).expect("hmac takes keys of any size");
    mac.update(string_to_sign.as_bytes());
    base64::encode(mac.finalize().into_bytes())
}

#[derive(Debug)]
pub struct SignedRequest {
    /// The HTTP Method
    pub method: String,
    /// The AWS Service
    pub service: String,
    /// The AWS Region
    pub region: String,
    /// The HTTP Request path
    pub path: String,
    /// The HTTP Request Headers
    pub headers: BTreeMap<String, Vec<Vec<u8>>>,
    /// The HTTP Request paramaters
    pub params: Params,
    /// The AWS hostname
    pub hostname: String,
    // The Standardised query string
    pub canonical_query_string: String,
    /// The Standardised URI
    pub canonical_uri: String,
}

impl SignedRequest {
    /// Default constructor
    pub fn new(method: &str, service: &str, region: &str, path: &str, host: &str) -> SignedRequest {
        SignedRequest {
            method: method.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            path: path.to_string(),
            headers: BTreeMap::new(),
            params: Params::new(),
            hostname: host.to_string(),
            canonical_query_string: String::new(),
            canonical_uri: String::new(),
        }
    }

    /// Invokes `canonical_uri(path)` to return a canonical path
    pub fn canonical_path(&self) -> String {
        encode_uri_path(&self.path)
    }

    /// Converts a paramater such as "example param": "examplekey" into "&example+param=examplekey"
    pub fn canonical_query_string(&self) -> &str {
        &self.canonical_query_string
    }

    /// If the key exists in headers, set it to blank/unoccupied:
    pub fn remove_header(&mut self, key: &str) {
        let key_lower = key.to_ascii_lowercase();
        self.headers.remove(&key_lower);
    }

    /// Add a value to the array of headers for the specified key.
    /// Headers are kept sorted by key name for use at signing (BTreeMap)
    pub fn add_header<K: ToString>(&mut self, key: K, value: &str) {
        let mut key_lower = key.to_string();
        key_lower.make_ascii_lowercase();

        let value_vec = value.as_bytes().to_vec();

        self.headers.entry(key_lower).or_default().push(value_vec);
    }

    /// Returns the first value of a header as a string, empty when absent.
    pub fn header_value(&self, key: &str) -> String {
        self.headers
            .get(&key.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default()
    }

     /// Returns the current HTTP method
     pub fn method(&self) -> &str {
        &self.method
    }

    /// Modify the region used for signing if needed, such as for AWS Organizations
    pub fn region_for_service(&self) -> String {
        self.region.to_string()
    }

    /// Adds parameter to the HTTP Request
    pub fn add_param<S>(&mut self, key: S, value: S)
    where
        S: Into<String>,
    {
        self.params.insert(key.into(), Some(value.into()));
    }

    /// Path plus the query string, ready to be appended to the endpoint.
    pub fn path_and_query(&self) -> String {
        let query = build_query_string(&self.params);
        if query.is_empty() {
            self.canonical_path()
        } else {
            format!("{}?{}", self.canonical_path(), query)
        }
    }

    /// Complement SignedRequest by ensuring the following HTTP headers are set accordingly:
    /// - host
    /// - content-type
    pub fn complement(&mut self) {
        // build the canonical request
        self.canonical_uri = self.canonical_path();
        self.canonical_query_string = build_canonical_query_string(&self.params);

        // if there's no content-type header set, set it to the default value
        if let Entry::Vacant(entry) = self.headers.entry("content-type".to_owned()) {
            let mut values = Vec::new();
            values.push(b"application/octet-stream".to_vec());
            entry.insert(values);
        }

        self.remove_header("host");
        self.add_header("host", &self.hostname.to_string());
    }

    pub fn sign(&mut self, version: SignVersion, creds: &AwsCredentials, payload: &Payload) {
        let now = Utc::now();
        match version {
            SignVersion::V4 => self.sign_v4_at(creds, payload, now),
            SignVersion::V2 => self.sign_v2_at(creds, payload, now),
        }
    }

    fn add_md5(&mut self, payload: &Payload) {
        if let Payload::Buffer(data) = payload {
            let request_md5 = Md5::digest(*data);
            self.remove_header("Content-Md5");
            self.add_header("Content-Md5", &base64::encode(&*request_md5));
        }
    }

    fn add_token(&mut self, creds: &AwsCredentials) {
        self.remove_header("x-amz-security-token");
        if let Some(token) = &creds.token {
            self.add_header("x-amz-security-token", token);
        }
    }

    /// Signs the request using Amazon Signature v4 to verify identity.
    pub fn sign_v4_at(&mut self, creds: &AwsCredentials, payload: &Payload, date: DateTime<Utc>) {
        self.complement();
        self.remove_header("x-amz-date");
        self.add_header("x-amz-date", &date.format("%Y%m%dT%H%M%SZ").to_string());

        // get the key x-amz-content-sha256 corresponding value.
        let digest = match payload {
            Payload::Buffer(data) if data.is_empty() => EMPTY_SHA256_HASH.to_string(),
            Payload::Buffer(data) => to_hexdigest(data),
            Payload::Unsigned => UNSIGNED_PAYLOAD.to_string(),
        };
        self.remove_header("x-amz-content-sha256");
        self.add_header("x-amz-content-sha256", &digest);

        self.add_md5(payload);
        self.add_token(creds);

        // organization signed_headers
        let signed_headers = signed_headers(&self.headers);

        // organization canonical_headers
        let canonical_headers = canonical_headers(&self.headers);

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            &self.method,
            self.canonical_uri,
            self.canonical_query_string,
            canonical_headers,
            signed_headers,
            digest
        );

        // use the hashed canonical request to build the string to sign
        let hashed_canonical_request = to_hexdigest(&canonical_request);
        let scope = format!(
            "{}/{}/{}/aws4_request",
            date.format("%Y%m%d"),
            &self.region_for_service(),
            &self.service
        );
        let string_to_sign = string_to_sign(date, &hashed_canonical_request, &scope);

         // sign the string
         let signature = sign_string(
            &string_to_sign,
            creds.aws_secret_access_key(),
            date.naive_utc().date(),
            &self.region_for_service(),
            &self.service,
        );

        // build the actual auth header
        let auth_header = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            &creds.aws_access_key_id(),
            scope,
            signed_headers,
            signature
        );
        self.remove_header("authorization");
        self.add_header("authorization", &auth_header);
    }

    /// The V2 canonical resource: path plus the sorted sub-resources.
    pub fn canonical_resource_v2(&self) -> String {
        let mut resource = self.canonical_path();
        let mut first = true;
        for (key, val) in self.params.iter() {
            if !V2_SUB_RESOURCES.contains(&key.as_str()) {
                continue;
            }
            resource.push(if first { '?' } else { '&' });
            first = false;
            resource.push_str(key);
            match val {
                Some(v) if !v.is_empty() => {
                    resource.push('=');
                    resource.push_str(v);
                }
                _ => {}
            }
        }
        resource
    }

    pub fn string_to_sign_v2(&self) -> String {
        let mut amz_headers = String::new();
        for (key, values) in self.headers.iter() {
            if key.starts_with("x-amz-") {
                amz_headers.push_str(&format!("{}:{}\n", key, canonical_values(values)));
            }
        }
        format!(
            "{}\n{}\n{}\n{}\n{}{}",
            self.method,
            self.header_value("content-md5"),
            self.header_value("content-type"),
            self.header_value("date"),
            amz_headers,
            self.canonical_resource_v2()
        )
    }

    /// Signs the request using the legacy Amazon Signature v2.
    pub fn sign_v2_at(&mut self, creds: &AwsCredentials, payload: &Payload, date: DateTime<Utc>) {
        self.complement();
        self.remove_header("date");
        self.add_header("date", &date.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        self.add_md5(payload);
        self.add_token(creds);

        let signature = sign_string_v2(&self.string_to_sign_v2(), creds.aws_secret_access_key());
        let auth_header = format!("AWS {}:{}", creds.aws_access_key_id(), signature);
        self.remove_header("authorization");
        self.add_header("authorization", &auth_header);
    }
}
