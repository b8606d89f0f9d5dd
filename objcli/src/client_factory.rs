use std::time::Duration;
use log::debug;

use common::error::Errno;
use common::http_client::TransportOptions;
use s3::signature::{AwsCredentials, SignVersion};
use s3::{ObjectService, S3Client, S3ClientConfig};

/// Endpoint and credentials resolved from the config file and the command line.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub sts_token: String,
    pub region: String,
    pub sign_version: SignVersion,
    // seconds, 0 means no timeout.
    pub connect_timeout: u64,
    pub read_timeout: u64,
    pub user_agent: String,
    // empty means direct connections.
    pub proxy_host: String,
    pub proxy_user: String,
    pub proxy_pwd: String,
    pub skip_verify_cert: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            endpoint: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            sts_token: String::new(),
            region: common::config::DEFAULT_REGION.to_string(),
            sign_version: SignVersion::V4,
            connect_timeout: common::config::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: common::config::DEFAULT_READ_TIMEOUT,
            user_agent: String::new(),
            proxy_host: String::new(),
            proxy_user: String::new(),
            proxy_pwd: String::new(),
            skip_verify_cert: false,
        }
    }
}

fn timeout(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

impl ClientOptions {
    pub fn to_client_config(&self) -> Result<S3ClientConfig, Errno> {
        if self.endpoint.is_empty() {
            return Err(Errno::Econfig(String::from("endpoint is not set, use --endpoint or the config file")));
        }
        if self.access_key_id.is_empty() || self.access_key_secret.is_empty() {
            return Err(Errno::Econfig(String::from("access key id and access key secret are not set")));
        }
        let user_agent = if self.user_agent.is_empty() {
            format!("objcli/{}", env!("CARGO_PKG_VERSION"))
        } else {
            self.user_agent.clone()
        };
        Ok(S3ClientConfig {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            credentials: AwsCredentials::new(&self.access_key_id, &self.access_key_secret)
                .with_token(&self.sts_token),
            sign_version: self.sign_version,
            transport: TransportOptions {
                connect_timeout: timeout(self.connect_timeout),
                read_timeout: timeout(self.read_timeout),
                proxy_host: self.proxy_host.clone(),
                proxy_user: self.proxy_user.clone(),
                proxy_pwd: self.proxy_pwd.clone(),
                skip_verify_cert: self.skip_verify_cert,
            },
            user_agent: user_agent,
            // listing pages are retried by the command.
            retry_times: 1,
        })
    }
}

pub trait ClientFactory {
    fn create(&self) -> Result<Box<dyn ObjectService>, Errno>;
}

pub struct S3ClientFactory {
    options: ClientOptions,
}

impl S3ClientFactory {
    pub fn new(options: ClientOptions) -> S3ClientFactory {
        S3ClientFactory {
            options: options,
        }
    }
}

impl ClientFactory for S3ClientFactory {
    fn create(&self) -> Result<Box<dyn ObjectService>, Errno> {
        let cfg = self.options.to_client_config()?;
        debug!("create client for endpoint: {}, region: {}, sign version: {:?}",
            cfg.endpoint, cfg.region, cfg.sign_version);
        let client = S3Client::new(cfg)?;
        Ok(Box::new(client))
    }
}
