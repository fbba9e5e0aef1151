//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use cardshop_config::ConfigError;
use cardshop_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the storefront service: {reason}")]
    #[diagnostic(
        code(cardshop::connection_failed),
        help(
            "Check that the service is running and accessible.\n\
             Point at another one with --service <URL> or a profile's service_url."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(cardshop::not_found),
        help("Run: cardshop {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Cannot {action} {resource_type} '{identifier}': {reason}")]
    #[diagnostic(code(cardshop::conflict))]
    Conflict {
        action: String,
        resource_type: String,
        identifier: String,
        reason: String,
    },

    // ── Service ──────────────────────────────────────────────────────
    #[error("The service rejected the request{status}: {message}")]
    #[diagnostic(
        code(cardshop::rejected),
        help("The change was rolled back locally; nothing was saved.")
    )]
    Rejected { status: String, message: String },

    #[error("Request timed out{after}")]
    #[diagnostic(
        code(cardshop::timeout),
        help("Increase the timeout with --timeout or check service responsiveness.")
    )]
    Timeout { after: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cardshop::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(cardshop::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cardshop::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cardshop config init --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(cardshop::config))]
    Config(#[from] ConfigError),

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(cardshop::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(cardshop::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn not_found(resource_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.to_string(),
            list_command: format!("{resource_type}s list"),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::NotFound { entity, key } => CliError::not_found(&entity, key),

            CoreError::NetworkUnavailable { reason } => CliError::ConnectionFailed { reason },

            CoreError::RemoteRejected { status, message } => CliError::Rejected {
                status: status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(),
                message,
            },

            CoreError::Timeout { timeout_ms } => CliError::Timeout {
                after: timeout_ms.map(|ms| format!(" after {ms}ms")).unwrap_or_default(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
