use serde::Deserialize;
use thiserror::Error;

/// Exception severity levels reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Common,
    Suspicious,
    Fault,
}

/// Failures surfaced synchronously by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed caller input: empty ids, non-finite numbers.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// An operation was attempted without its prerequisite.
    #[error("not configured: {0}")]
    Configuration(String),

    /// A value fell outside a domain-specific bound.
    #[error("out of range: {0}")]
    Range(String),

    /// The session is in a state that does not allow the operation.
    #[error("invalid state: {0}")]
    State(String),

    /// The node rejected an awaited playback update.
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl SessionError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors from talking to a remote node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("node rejected request: {0}")]
    Rejected(String),

    #[error("node dispatcher closed")]
    Closed,
}

/// JSON error body returned by Lavalink v4 compatible nodes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeErrorBody {
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: u64,
    pub status: u16,
    /// HTTP status reason phrase (e.g. "Bad Request").
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub trace: Option<String>,
}

impl From<NodeErrorBody> for NodeError {
    fn from(body: NodeErrorBody) -> Self {
        let message = if body.message.is_empty() {
            body.error
        } else {
            body.message
        };
        Self::Status {
            status: body.status,
            message,
        }
    }
}

/// Failure to turn a placeholder track into a playable one.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no matches found for '{0}'")]
    NoMatches(String),

    #[error("no track resolver configured")]
    NoResolver,

    #[error("load failed ({severity:?}): {message}")]
    LoadFailed { severity: Severity, message: String },

    #[error(transparent)]
    Node(#[from] NodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config.toml or config.default.toml not found")]
    NotFound,

    #[error("{0} is empty")]
    Empty(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
