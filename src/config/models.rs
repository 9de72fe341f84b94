use crate::gate::GatePolicy;
use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub content_store: ContentStoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

impl Config {
    /// Explicit `gate.policy`, else the environment's default
    pub fn gate_policy(&self) -> GatePolicy {
        self.gate
            .policy
            .unwrap_or_else(|| GatePolicy::for_environment(self.server.environment))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Externally visible origin used in self-referential URLs; when unset
    /// the request's `Host` header is used. Set it in production.
    pub public_url: Option<String>,
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default)]
    pub environment: Environment,
    /// Path prefix the protocol adapters are mounted under
    #[serde(default = "default_remote_prefix")]
    pub remote_prefix: String,
}

impl ServerConfig {
    /// Production deployment deriving V1 self URLs from the client's `Host`
    pub fn trusts_client_host(&self) -> bool {
        self.public_url.is_none() && self.environment == Environment::Production
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_url: None,
            name: default_server_name(),
            environment: Environment::default(),
            remote_prefix: default_remote_prefix(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_server_name() -> String {
    "recipegate".to_string()
}

fn default_remote_prefix() -> String {
    "/github".to_string()
}

/// Content store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentStoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Store-side branch recipes are published under
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: ByteSize,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tag: default_tag(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            max_document_bytes: default_max_document_bytes(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_tag() -> String {
    "barbarian".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("recipegate/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_document_bytes() -> ByteSize {
    ByteSize(4 * 1024 * 1024) // 4 MB
}

/// Relational index configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

fn default_index_url() -> String {
    "sqlite://data/recipegate.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GateConfig {
    pub policy: Option<GatePolicy>,
}
