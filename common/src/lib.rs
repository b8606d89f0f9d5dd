pub mod config;
pub mod http_client;
pub mod error;
pub mod runtime;
pub mod logger;
use log::{debug, error};
use error::Errno;

pub fn parse_config(path: &str) -> Result<config::Config, Errno>{
    let results = std::fs::read_to_string(path);
    match results {
        Ok(content) => {
            let cfg = parse_config_str(&content)?;
            debug!("cfg from {}: {:?}", path, cfg);
            return Ok(cfg);
        }
        Err(error) => {
            error!("failed to read config {}, err: {:?}", path, error);
            return Err(Errno::Econfig(format!("failed to read config file {}, err: {}", path, error)));
        }
    }
}

pub fn parse_config_str(content: &str) -> Result<config::Config, Errno> {
    toml::from_str(content).map_err(|err| Errno::Econfig(format!("failed to parse config, err: {}", err)))
}
