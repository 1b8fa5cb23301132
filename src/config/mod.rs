mod file_config;

pub use file_config::{FileConfig, PushConfig};

use crate::push::PushSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub vapid_private_key: Option<String>,
    pub vapid_subject: Option<String>,
}

/// Resolved push configuration; present only when VAPID credentials are set.
#[derive(Debug, Clone)]
pub struct ResolvedPush {
    pub vapid_private_key: String,
    pub vapid_subject: String,
    pub settings: PushSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// None => the server runs with push delivery disabled.
    pub push: Option<ResolvedPush>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        // Push settings - VAPID credentials gate the whole feature
        let push_file = file.push.unwrap_or_default();
        let vapid_private_key = push_file
            .vapid_private_key
            .or_else(|| cli.vapid_private_key.clone());
        let vapid_subject = push_file
            .vapid_subject
            .or_else(|| cli.vapid_subject.clone());

        let push = match (vapid_private_key, vapid_subject) {
            (Some(key), Some(subject)) => {
                let mut settings = PushSettings::default();
                if let Some(icon) = push_file.default_icon {
                    settings.default_icon = icon;
                }
                if let Some(ttl) = push_file.ttl_secs {
                    settings.ttl_secs = ttl;
                }
                if let Some(codes) = push_file.evict_status_codes {
                    settings.evict_status_codes = codes;
                }
                Some(ResolvedPush {
                    vapid_private_key: key,
                    vapid_subject: subject,
                    settings,
                })
            }
            (Some(_), None) => {
                bail!("vapid_subject must be set when vapid_private_key is configured")
            }
            (None, _) => None,
        };

        Ok(AppConfig {
            db_path,
            port,
            logging_level,
            push,
        })
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_db() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("notifications.db")),
            port: 8001,
            ..CliConfig::default()
        }
    }

    #[test]
    fn resolves_from_cli_alone() {
        let config = AppConfig::resolve(&cli_with_db(), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("notifications.db"));
        assert_eq!(config.port, 8001);
        assert!(config.push.is_none());
    }

    #[test]
    fn missing_db_path_is_an_error() {
        let cli = CliConfig::default();
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn toml_overrides_cli() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 9000
            logging_level = "none"
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli_with_db(), Some(file)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::None);
    }

    #[test]
    fn push_section_configures_dispatcher_settings() {
        let file: FileConfig = toml::from_str(
            r#"
            [push]
            vapid_private_key = "c2VjcmV0"
            vapid_subject = "mailto:ops@example.com"
            ttl_secs = 600
            evict_status_codes = [404, 410, 403]
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli_with_db(), Some(file)).unwrap();
        let push = config.push.unwrap();
        assert_eq!(push.vapid_subject, "mailto:ops@example.com");
        assert_eq!(push.settings.ttl_secs, 600);
        assert_eq!(push.settings.evict_status_codes, vec![404, 410, 403]);
    }

    #[test]
    fn vapid_key_without_subject_is_an_error() {
        let file: FileConfig = toml::from_str(
            r#"
            [push]
            vapid_private_key = "c2VjcmV0"
            "#,
        )
        .unwrap();
        assert!(AppConfig::resolve(&cli_with_db(), Some(file)).is_err());
    }
}
