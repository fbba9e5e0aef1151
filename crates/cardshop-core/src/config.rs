// ── Runtime service configuration ──
//
// Describes how to reach the storefront service and how long to wait for it.
// Never touches disk; the CLI builds a `ServiceConfig` from its profile and
// hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Base URL used when no profile or override names one.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development deployments).
    DangerAcceptInvalid,
}

/// Configuration for one storefront service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service root, e.g. `http://localhost:8080` or `http://host/MTG-Service/`.
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Default deadline for a whole optimistic mutation. `None` = no deadline
    /// beyond the HTTP timeout.
    pub mutation_timeout: Option<Duration>,
    /// How often to reload every collection (seconds). 0 = never.
    pub refresh_interval_secs: u64,
}

impl ServiceConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            mutation_timeout: None,
            refresh_interval_secs: 0,
        }
    }
}
