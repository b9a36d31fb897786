use serde::{Deserialize, Serialize};

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryConfig {
    /// Sentry DSN used to report launcher failures.
    pub dsn: String,
}
