//! Shared configuration for cardshop tools.
//!
//! TOML profiles naming a storefront service, layered with `CARDSHOP_*`
//! environment overrides, and translation to `cardshop_core::ServiceConfig`.
//! The CLI adds flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardshop_core::{DEFAULT_SERVICE_URL, ServiceConfig, TlsVerification};

/// Name of the profile used when none is configured or requested.
pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile name to use: the explicit one, else the configured default.
    pub fn active_profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
    }

    /// Look up a profile. The default profile always resolves, falling
    /// back to the local development service when the file doesn't name it.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == DEFAULT_PROFILE => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile(name.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named storefront service profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Service root URL (e.g., "http://localhost:8080").
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// HTTP timeout override (seconds).
    pub timeout: Option<u64>,

    /// Deadline for one optimistic mutation (seconds).
    pub mutation_timeout: Option<u64>,

    /// Reload every collection this often (seconds). 0 or absent = never.
    pub refresh_interval: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            mutation_timeout: None,
            refresh_interval: None,
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "cardshop", "cardshop").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cardshop");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults and env still apply.
///
/// Env keys nest with a double underscore:
/// `CARDSHOP_PROFILES__LOCAL__SERVICE_URL=http://...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CARDSHOP_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse a service URL, requiring http or https.
pub fn parse_service_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "service_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "service_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `ServiceConfig` from a profile and the global defaults, with no
/// CLI flag overrides.
pub fn profile_to_service_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let mut config = ServiceConfig::new(parse_service_url(&profile.service_url)?);

    config.tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.mutation_timeout = profile
        .mutation_timeout
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    config.refresh_interval_secs = profile.refresh_interval.unwrap_or(0);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    // Loading reads process env, so every loader test runs inside a Jail.

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let config = load_config_from(&jail.directory().join("absent.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.active_profile_name(None), "default");
            Ok(())
        });
    }

    #[test]
    fn file_profiles_are_loaded() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
default_profile = "shop"

[defaults]
timeout = 10

[profiles.shop]
service_url = "http://shop.local/MTG-Service/"
mutation_timeout = 5
refresh_interval = 60
"#,
            )?;

            let config = load_config_from(&jail.directory().join("config.toml")).unwrap();
            let name = config.active_profile_name(None);
            assert_eq!(name, "shop");

            let profile = config.profile(name).unwrap();
            let service = profile_to_service_config(&profile, &config.defaults).unwrap();
            assert_eq!(service.base_url.as_str(), "http://shop.local/MTG-Service/");
            assert_eq!(service.timeout, Duration::from_secs(10));
            assert_eq!(service.mutation_timeout, Some(Duration::from_secs(5)));
            assert_eq!(service.refresh_interval_secs, 60);
            assert_eq!(service.tls, TlsVerification::SystemDefaults);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[profiles.shop]
service_url = "http://shop.local"
"#,
            )?;
            jail.set_env("CARDSHOP_DEFAULT_PROFILE", "shop");
            jail.set_env("CARDSHOP_PROFILES__SHOP__TIMEOUT", "3");

            let config = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(config.active_profile_name(None), "shop");
            assert_eq!(config.profile("shop").unwrap().timeout, Some(3));
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.profile("staging"),
            Err(ConfigError::UnknownProfile(name)) if name == "staging"
        ));
        assert_eq!(config.profile("default").unwrap(), Profile::default());
    }

    #[test]
    fn insecure_beats_custom_ca() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/etc/shop-ca.pem".into()),
            ..Profile::default()
        };
        let service = profile_to_service_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(service.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = parse_service_url("ftp://shop.local").unwrap_err();
        assert!(err.to_string().contains("expected http or https"));
        assert!(parse_service_url("not a url").is_err());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert(
            "local".into(),
            Profile {
                refresh_interval: Some(30),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        Jail::expect_with(|_jail| {
            let loaded = load_config_from(&path).unwrap();
            assert_eq!(loaded.profiles["local"].refresh_interval, Some(30));
            Ok(())
        });
    }
}
