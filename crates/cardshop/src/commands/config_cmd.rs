//! Config subcommand handlers.

use std::fmt::Write;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

/// Human-readable rendering of the effective configuration.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "service_url = \"{}\"", p.service_url);
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(secs) = p.mutation_timeout {
            let _ = writeln!(out, "mutation_timeout = {secs}");
        }
        if let Some(secs) = p.refresh_interval {
            let _ = writeln!(out, "refresh_interval = {secs}");
        }
    }

    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(global.output, &cfg, format_config, |c| {
                c.active_profile_name(None).to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            service_url,
            refresh_interval,
            mutation_timeout,
            set_default,
        } => {
            // Reject a bad URL before anything is written.
            config::parse_service_url(&service_url)?;

            let mut cfg = config::load_config()?;
            let name = config::active_profile_name(global, &cfg);

            if cfg.profiles.contains_key(&name)
                && !util::confirm(&format!("Overwrite profile '{name}'?"), global.yes)?
            {
                return Ok(());
            }

            let profile = Profile {
                service_url,
                insecure: global.insecure.then_some(true),
                timeout: global.timeout,
                mutation_timeout,
                refresh_interval,
                ..Profile::default()
            };
            cfg.profiles.insert(name.clone(), profile);
            if set_default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            output::print_done(
                &format!("Profile '{name}' written to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            if cfg.profiles.is_empty() {
                output::print_done(
                    "No profiles configured. Run: cardshop config init",
                    global.quiet,
                );
                return Ok(());
            }
            let default = cfg.active_profile_name(None);
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            let lines: Vec<String> = names
                .into_iter()
                .map(|name| {
                    if name == default {
                        format!("{name} *")
                    } else {
                        name.clone()
                    }
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::print_done(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
