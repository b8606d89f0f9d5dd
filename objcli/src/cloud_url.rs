use percent_encoding::percent_decode_str;

use common::error::Errno;

pub const SCHEME_PREFIX: &str = "s3://";
pub const URL_ENCODING: &str = "url";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloudUrl {
    pub bucket: String,
    // empty when the url only names a bucket.
    pub object: String,
}

pub fn decode_url(value: &str) -> Result<String, Errno> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|err| Errno::Einval(format!("{} is not url encoded, {}", value, err)))
}

impl CloudUrl {
    /// Parses `s3://bucket[/object]`, decoding it first when the encoding type is `url`.
    pub fn parse(url: &str, encoding_type: &str) -> Result<CloudUrl, Errno> {
        let url = match encoding_type {
            "" => url.to_string(),
            URL_ENCODING => decode_url(url)?,
            _ => {
                return Err(Errno::Einval(format!("invalid encoding type: {}, only {} is supported", encoding_type, URL_ENCODING)));
            }
        };

        match url.get(..SCHEME_PREFIX.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(SCHEME_PREFIX) => {}
            _ => {
                return Err(Errno::Einval(format!("invalid cloud url: {}, it should start with {}", url, SCHEME_PREFIX)));
            }
        }
        let path = &url[SCHEME_PREFIX.len()..];
        let (bucket, object) = match path.find('/') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => (path, ""),
        };
        if bucket.is_empty() {
            return Err(Errno::Einval(format!("invalid cloud url: {}, bucket name is empty", url)));
        }
        Ok(CloudUrl {
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }
}
