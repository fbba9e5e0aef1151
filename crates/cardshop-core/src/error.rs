// ── Core error types ──
//
// User-facing errors from cardshop-core. Consumers never see raw HTTP
// status handling or JSON decode failures; the `From<cardshop_api::Error>`
// impl folds transport-layer errors into this taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a [`CoreError`], for callers that branch on
/// the kind of failure rather than its payload (exit codes, retry UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    NetworkUnavailable,
    RemoteRejected,
    Timeout,
    Config,
    Internal,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Local errors ─────────────────────────────────────────────────
    /// Input rejected before anything was touched.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("Storefront service unreachable: {reason}")]
    NetworkUnavailable { reason: String },

    #[error("Rejected by service{}: {message}", status_suffix(.status))]
    RemoteRejected { status: Option<u16>, message: String },

    /// `timeout_ms` is `None` when the transport reports a timeout without
    /// saying which limit it hit.
    #[error("Request timed out{}", after_suffix(.timeout_ms))]
    Timeout { timeout_ms: Option<u64> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

#[allow(clippy::ref_option)]
fn after_suffix(timeout_ms: &Option<u64>) -> String {
    timeout_ms.map(|ms| format!(" after {ms}ms")).unwrap_or_default()
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::Timeout {
            timeout_ms: Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NetworkUnavailable { .. } => ErrorKind::NetworkUnavailable,
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Config { .. } => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Replace a generic "resource" not-found with the entity and key the
    /// caller was actually asking about.
    pub(crate) fn for_entity(self, entity: &str, key: &impl ToString) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(entity, key.to_string()),
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cardshop_api::Error> for CoreError {
    fn from(err: cardshop_api::Error) -> Self {
        if err.is_timeout() {
            return CoreError::Timeout { timeout_ms: None };
        }
        if err.is_unreachable() {
            return CoreError::NetworkUnavailable {
                reason: err.to_string(),
            };
        }

        match err {
            cardshop_api::Error::Http {
                status: 404,
                message,
            } => CoreError::NotFound {
                entity: "resource".into(),
                key: message,
            },
            cardshop_api::Error::Http { status, message } => CoreError::RemoteRejected {
                status: Some(status),
                message,
            },
            cardshop_api::Error::Transport(ref e) => match e.status() {
                Some(s) if s.as_u16() == 404 => CoreError::NotFound {
                    entity: "resource".into(),
                    key: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                },
                Some(s) => CoreError::RemoteRejected {
                    status: Some(s.as_u16()),
                    message: e.to_string(),
                },
                None => CoreError::NetworkUnavailable {
                    reason: e.to_string(),
                },
            },
            cardshop_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cardshop_api::Error::Tls(msg) => CoreError::NetworkUnavailable {
                reason: format!("TLS error: {msg}"),
            },
            cardshop_api::Error::Deserialization { message, body: _ } => {
                CoreError::RemoteRejected {
                    status: None,
                    message,
                }
            }
        }
    }
}
