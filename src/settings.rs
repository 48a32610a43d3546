use std::env;
use std::net;
use std::path::Path;
use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dns::{DomainName, Question, UnknownMnemonic, MAX_UDP_MESSAGE_LEN};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server_address: net::IpAddr,
    pub server_port: u16,

    pub timeout_ms: u64,
    pub max_message_len: usize,

    pub query: QuerySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySettings {
    pub name: DomainName,
    pub record_type: String,
    pub class: String,
    pub recursion_desired: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = defaults()?
            .add_source(File::with_name("/etc/dnsr/config.toml").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("dnsr")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reads a single file on top of the built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    pub fn server(&self) -> net::SocketAddr {
        net::SocketAddr::from((self.server_address, self.server_port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn question(&self) -> Result<Question, UnknownMnemonic> {
        Ok(Question::new(
            self.query.name.clone(),
            self.query.record_type.parse()?,
            self.query.class.parse()?,
        ))
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server_address", "8.8.8.8")?
        .set_default("server_port", 53)?
        .set_default("timeout_ms", 5000)?
        .set_default("max_message_len", MAX_UDP_MESSAGE_LEN as u64)?
        .set_default("query.name", "dns.google.com")?
        .set_default("query.record_type", "A")?
        .set_default("query.class", "IN")?
        .set_default("query.recursion_desired", true)
}
