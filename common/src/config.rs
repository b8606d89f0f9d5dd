use serde_derive::Deserialize;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SIGN_VERSION: &str = "v4";
pub const DEFAULT_RETRY_TIMES: i64 = 10;
// seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 120;
pub const DEFAULT_READ_TIMEOUT: u64 = 1200;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CredentialConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    #[serde(default)]
    pub sts_token: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub sign_version: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_retry_times")]
    pub retry_times: i64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    #[serde(default)]
    pub user_agent: String,
    // host[:port] of an http proxy, empty means direct connections.
    #[serde(default)]
    pub proxy_host: String,
    #[serde(default)]
    pub proxy_user: String,
    #[serde(default)]
    pub proxy_pwd: String,
    #[serde(default)]
    pub skip_verify_cert: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            retry_times: DEFAULT_RETRY_TIMES,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            user_agent: String::new(),
            proxy_host: String::new(),
            proxy_user: String::new(),
            proxy_pwd: String::new(),
            skip_verify_cert: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    // empty means stderr.
    #[serde(default)]
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

fn default_retry_times() -> i64 {
    DEFAULT_RETRY_TIMES
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
