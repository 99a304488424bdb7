use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    pub identifier: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    #[serde(default)]
    pub secure: bool,
    /// Session id handed out by the node's `ready` op.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Prefix used when searching for placeholder tracks, e.g. `ytsearch`.
    #[serde(default = "default_search_prefix")]
    pub search_prefix: String,
}

impl NodeConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_search_prefix() -> String {
    "ytsearch".to_string()
}
