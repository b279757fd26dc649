use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("not logged in")]
    NotAuthenticated,

    /// The server does not offer this operation.
    #[error("operation not supported by server: {0}")]
    Unsupported(String),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, RemoteError::Unsupported(_))
    }

    /// Errors worth retrying: throttling, server faults and transport failures.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Api { status, .. } => *status == 429 || (500..600).contains(status),
            RemoteError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::RemoteError;

    #[test]
    fn classifies_statuses() {
        let throttled = RemoteError::Api {
            status: 429,
            message: String::new(),
        };
        let fault = RemoteError::Api {
            status: 503,
            message: String::new(),
        };
        let missing = RemoteError::Api {
            status: 404,
            message: String::new(),
        };
        assert!(throttled.is_transient());
        assert!(fault.is_transient());
        assert!(!missing.is_transient());
        assert!(!RemoteError::NotAuthenticated.is_transient());
        assert!(RemoteError::Unsupported("list".into()).is_unsupported());
    }
}
