//! Dashboard configuration.

use std::time::Duration;

/// Backend address used when `AUDITBOARD_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8000/ws/audit";

/// Fixed reconnect interval. Retries are unconditional and unbounded; there
/// is no backoff growth and no attempt cap.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Settings for one dashboard process.
///
/// `backend_url` is handed to whichever [`Transport`](crate::transport::Transport)
/// implementation the embedding application supplies; `retry_interval` drives
/// the connection manager's retry timer (tests shrink it for determinism).
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub retry_interval: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: Self::resolve_backend_url(None),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl DashboardConfig {
    fn resolve_backend_url(provided: Option<String>) -> String {
        if let Some(url) = provided {
            return url;
        }
        dotenvy::dotenv().ok();
        std::env::var("AUDITBOARD_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn new(backend_url: Option<String>) -> Self {
        Self {
            backend_url: Self::resolve_backend_url(backend_url),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }
}
