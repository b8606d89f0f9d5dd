use thiserror::Error;

#[derive(Debug, Error)]
pub enum Errno {
    // bad input detected locally, before any request is sent.
    #[error("{0}")]
    Einval(String),
    // missing or invalid configuration.
    #[error("config error: {0}")]
    Econfig(String),
    // the target object or bucket does not exist.
    #[error("not found: {0}")]
    Enotf(String),
    // the service rejected the credentials.
    #[error("access denied: {0}")]
    Eaccess(String),
    // append position does not match the object length.
    #[error("the value of position does not match the length of the current object, next append position is {0}")]
    Eoffset(u64),
    #[error("service error, status: {status}, code: {code}, message: {message}, request id: {request_id}")]
    Eservice {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },
    // transport level failure.
    #[error("http request failed: {0}")]
    Ehttp(String),
    #[error("io error: {0}")]
    Eio(#[from] std::io::Error),
    // malformed response.
    #[error("parse error: {0}")]
    Eparse(String),
    // internal error.
    #[error("internal error: {0}")]
    Eintr(String),
}

impl Errno {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Errno::Enotf(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Errno::Einval(_))
    }
}
