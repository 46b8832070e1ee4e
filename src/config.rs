use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::reminders::DEFAULT_HORIZON_DAYS;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub mail_relay_url: Option<String>,

    #[serde(default)]
    pub mail_relay_token: Option<String>,

    #[serde(default = "default_reminder_days")]
    pub reminder_days: u32,

    /// Hours between scheduled reminder checks. Zero disables the schedule.
    #[serde(default = "default_reminder_check_interval_hours")]
    pub reminder_check_interval_hours: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    listen_addr: Option<String>,
    from_email: Option<String>,
    admin_email: Option<String>,
    mail_relay_url: Option<String>,
    mail_relay_token: Option<String>,
    reminder_days: Option<u32>,
    reminder_check_interval_hours: Option<u64>,
    log_dir: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_from_email() -> String {
    "noreply@vendormanagement.com".to_string()
}

fn default_reminder_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_reminder_check_interval_hours() -> u64 {
    24
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {key}: {e}")),
        None => Ok(None),
    }
}

impl PartialServerConfig {
    fn from_file(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
    }

    fn from_env() -> Result<Self, String> {
        Ok(Self {
            database_url: env_string("DATABASE_URL"),
            listen_addr: env_string("LISTEN_ADDR"),
            from_email: env_string("DEFAULT_FROM_EMAIL"),
            admin_email: env_string("ADMIN_EMAIL"),
            mail_relay_url: env_string("MAIL_RELAY_URL"),
            mail_relay_token: env_string("MAIL_RELAY_TOKEN"),
            reminder_days: env_parsed("REMINDER_DAYS")?,
            reminder_check_interval_hours: env_parsed("REMINDER_CHECK_INTERVAL_HOURS")?,
            log_dir: env_string("LOG_DIR"),
        })
    }

    /// Fields set in `self` win over those in `base`.
    fn merge_over(self, base: PartialServerConfig) -> Result<ServerConfig, String> {
        Ok(ServerConfig {
            database_url: self
                .database_url
                .or(base.database_url)
                .ok_or("DATABASE_URL is required")?,
            listen_addr: self
                .listen_addr
                .or(base.listen_addr)
                .unwrap_or_else(default_listen_addr),
            from_email: self
                .from_email
                .or(base.from_email)
                .unwrap_or_else(default_from_email),
            admin_email: self.admin_email.or(base.admin_email),
            mail_relay_url: self.mail_relay_url.or(base.mail_relay_url),
            mail_relay_token: self.mail_relay_token.or(base.mail_relay_token),
            reminder_days: self
                .reminder_days
                .or(base.reminder_days)
                .unwrap_or_else(default_reminder_days),
            reminder_check_interval_hours: self
                .reminder_check_interval_hours
                .or(base.reminder_check_interval_hours)
                .unwrap_or_else(default_reminder_check_interval_hours),
            log_dir: self
                .log_dir
                .or(base.log_dir)
                .unwrap_or_else(default_log_dir),
        })
    }
}

impl ServerConfig {
    /// Loads `.env`, then the optional TOML file, then lets environment variables override it.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path_str) => PartialServerConfig::from_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };
        let env_config = PartialServerConfig::from_env()?;

        env_config.merge_over(file_config)
    }

    /// Parses a TOML document on its own, without consulting the environment.
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ServerConfig::from_toml_str(r#"database_url = "postgres://localhost/vendors""#).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.from_email, "noreply@vendormanagement.com");
        assert_eq!(config.reminder_days, 15);
        assert_eq!(config.reminder_check_interval_hours, 24);
        assert_eq!(config.admin_email, None);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        assert!(ServerConfig::from_toml_str("reminder_days = 7").is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let base = PartialServerConfig {
            database_url: Some("postgres://file/db".to_string()),
            admin_email: Some("file-admin@example.com".to_string()),
            reminder_days: Some(30),
            ..Default::default()
        };
        let overrides = PartialServerConfig {
            admin_email: Some("env-admin@example.com".to_string()),
            ..Default::default()
        };

        let config = overrides.merge_over(base).unwrap();
        assert_eq!(config.database_url, "postgres://file/db");
        assert_eq!(config.admin_email.as_deref(), Some("env-admin@example.com"));
        assert_eq!(config.reminder_days, 30);
    }

    #[test]
    fn test_merge_requires_database_url() {
        let result = PartialServerConfig::default().merge_over(PartialServerConfig::default());
        assert_eq!(result.unwrap_err(), "DATABASE_URL is required");
    }
}
