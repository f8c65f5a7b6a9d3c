use crate::storage::seed::CatalogSeed;
use chrono_tz::Tz;
use serde::Deserialize;
use std::{env, fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_port: Option<u16>,
    pub dev_cors_origin: Option<String>,
    /// IANA zone that decides when a "day" starts for daily missions.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_session_idle_hours")]
    pub session_idle_hours: i64,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Registered users with these emails are made admins at startup.
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(flatten)]
    pub catalog: CatalogSeed,
}

fn default_session_idle_hours() -> i64 {
    24
}

fn default_upload_dir() -> String {
    "data/uploads".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_port: None,
            dev_cors_origin: None,
            timezone: None,
            session_idle_hours: default_session_idle_hours(),
            cookie_secure: false,
            upload_dir: default_upload_dir(),
            admin_emails: Vec::new(),
            catalog: CatalogSeed::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid timezone: {0}")]
    Timezone(String),
    #[error("session_idle_hours must be positive")]
    SessionIdle,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(text)?;
        cfg.timezone()?;
        if cfg.session_idle_hours <= 0 {
            return Err(ConfigError::SessionIdle);
        }
        Ok(cfg)
    }

    /// Configured zone, UTC when unset.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(Tz::UTC),
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::Timezone(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_yaml("listen_port: 8080\n").unwrap();
        assert_eq!(cfg.listen_port, Some(8080));
        assert_eq!(cfg.session_idle_hours, 24);
        assert_eq!(cfg.upload_dir, "data/uploads");
        assert!(!cfg.cookie_secure);
        assert_eq!(cfg.timezone().unwrap(), Tz::UTC);
        assert!(cfg.catalog.is_empty());
    }

    #[test]
    fn catalog_sits_at_top_level() {
        let yaml = r#"
timezone: Europe/Warsaw
admin_emails: [root@example.com]
missions:
  - title: Read the handbook
    reward_points: 25
games:
  - title: Memory
    status: inactive
"#;
        let cfg = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::Warsaw);
        assert_eq!(cfg.admin_emails, vec!["root@example.com".to_string()]);
        assert_eq!(cfg.catalog.missions.len(), 1);
        assert_eq!(cfg.catalog.games.len(), 1);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = AppConfig::from_yaml("timezone: Mars/Olympus\n").unwrap_err();
        assert!(matches!(err, ConfigError::Timezone(_)));
    }

    #[test]
    fn zero_idle_hours_is_rejected() {
        let err = AppConfig::from_yaml("session_idle_hours: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::SessionIdle));
    }
}
