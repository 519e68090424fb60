//! Error types shared by the fetch gateways and the binary's composition root.

use thiserror::Error;

/// Failure of a single gateway call (page, genre list or image).
///
/// The paginator never lets these escape a run: a failed page is logged and
/// degraded according to the configured [`crate::logic::FailurePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connectivity problem, timeout, or a request that never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code returned by the server.
        status: u16,
        /// Request URL with the API key redacted.
        url: String,
    },
    /// The payload could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// A resource needed to build the request does not exist (e.g. no image path).
    #[error("missing resource: {0}")]
    MissingResource(String),
    /// Page numbers start at 1.
    #[error("invalid page number {0}")]
    InvalidPage(u32),
}

impl FetchError {
    /// What: Tell whether the error happened at the transport level.
    ///
    /// Output:
    /// - `true` for `Transport` and `Status`, `false` otherwise.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                url: err
                    .url()
                    .map(|u| crate::sources::redact_api_key(u.as_str()))
                    .unwrap_or_default(),
            };
        }
        Self::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors surfaced while wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    /// Filesystem or stdin/stdout failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Online mode needs an API key from the CLI or `settings.conf`.
    #[error("no TMDB API key configured (use --api-key, settings.conf, or --offline)")]
    MissingApiKey,
    /// A direct gateway call (e.g. an image request) failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Classify fetch errors by transport level.
    ///
    /// Inputs:
    /// - One value of every `FetchError` variant.
    ///
    /// Output:
    /// - Only `Transport` and `Status` report `is_transport()`.
    fn transport_classification() {
        assert!(FetchError::Transport("reset".into()).is_transport());
        assert!(
            FetchError::Status {
                status: 503,
                url: "https://example.test/movie/upcoming".into()
            }
            .is_transport()
        );
        assert!(!FetchError::Decode("eof".into()).is_transport());
        assert!(!FetchError::MissingResource("poster".into()).is_transport());
        assert!(!FetchError::InvalidPage(0).is_transport());
    }

    #[test]
    /// What: JSON syntax errors convert into `Decode`.
    fn serde_errors_become_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert!(matches!(FetchError::from(err), FetchError::Decode(_)));
    }
}
