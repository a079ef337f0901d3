use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("chat message not found: {0}")]
    MessageNotFound(String),

    #[error("chat message text must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

pub type Result<T> = std::result::Result<T, PortalError>;

/// Failure modes of a workflow-backend invocation.
///
/// `Rejected` is an application-level answer (`ok: false`); every other
/// variant means no envelope came back.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{message}")]
    Rejected {
        code: String,
        message: String,
        data: serde_json::Value,
    },

    #[error("invalid action name '{0}': expected a dot-namespaced identifier")]
    InvalidAction(String),

    #[error("workflow backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("workflow backend timed out")]
    Timeout,

    #[error("workflow backend answered HTTP {status} without an envelope")]
    Status { status: u16 },

    #[error("workflow backend reply is not an envelope: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("identity provider admin credentials are not configured")]
    AdminNotConfigured,

    /// The provider answered with a client error, e.g. `INVALID_ID_TOKEN`.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// The provider answered 5xx.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider unreachable: {0}")]
    Transport(reqwest::Error),
}

// Request URLs may carry credentials, so they are dropped before the error is
// displayed or logged.
impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}
