//! CLI configuration: thin wrapper around `cardshop_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--service, --timeout, etc.).

use std::time::Duration;

use cardshop_core::{ServiceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use cardshop_config::{
    Config, Profile, config_path, load_config, parse_service_url, profile_to_service_config,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config
        .active_profile_name(global.profile.as_deref())
        .to_string()
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the `ServiceConfig` for a command: config file and env first,
/// then CLI flag overrides.
///
/// A one-shot command never refreshes in the background, whatever the
/// profile says.
pub fn resolve_service_config(global: &GlobalOpts) -> Result<ServiceConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profile(&profile_name) {
        Ok(profile) => profile,
        // A bare --service works without any profile on disk.
        Err(_) if global.service.is_some() => Profile::default(),
        Err(_) => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
    };

    let mut service = profile_to_service_config(&profile, &cfg.defaults)?;

    if let Some(ref url) = global.service {
        service.base_url = parse_service_url(url)?;
    }
    if global.insecure {
        service.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        service.timeout = Duration::from_secs(secs);
    }
    service.refresh_interval_secs = 0;

    Ok(service)
}
