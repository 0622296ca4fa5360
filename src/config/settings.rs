//! Application settings loaded from `config.toml` and the environment.
//!
//! Every field has a default, the TOML file is optional, and environment
//! variables win over the file. The bot token is deliberately not part of
//! [`Settings`]; it is read from `DISCORD_BOT_TOKEN` right before the bot starts.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Runtime configuration of the bot.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Minutes of inactivity after which an unfinished conversation is dropped
    pub session_ttl_minutes: i64,
    /// Upper bound in seconds for any single database call
    pub persistence_timeout_secs: u64,
    /// Number of payments shown in the history view
    pub history_limit: u64,
    /// When set, only this Discord user may use the bot
    pub allowed_user_id: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            session_ttl_minutes: 60,
            persistence_timeout_secs: 10,
            history_limit: 10,
            allowed_user_id: None,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            message: format!("Failed to read config file {}: {e}", path.as_ref().display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Applies overrides using `lookup` to fetch variables by name.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(value) = parse_var(&lookup, "SESSION_TTL_MINUTES")? {
            self.session_ttl_minutes = value;
        }
        if let Some(value) = parse_var(&lookup, "PERSISTENCE_TIMEOUT_SECS")? {
            self.persistence_timeout_secs = value;
        }
        if let Some(value) = parse_var(&lookup, "HISTORY_LIMIT")? {
            self.history_limit = value;
        }
        if let Some(value) = parse_var(&lookup, "ALLOWED_USER_ID")? {
            self.allowed_user_id = Some(value);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config {
                message: "database_url must not be empty".to_string(),
            });
        }
        if self.session_ttl_minutes <= 0 {
            return Err(Error::Config {
                message: "session_ttl_minutes must be positive".to_string(),
            });
        }
        if self.persistence_timeout_secs == 0 {
            return Err(Error::Config {
                message: "persistence_timeout_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// True if `user_id` may talk to the bot.
    #[must_use]
    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.allowed_user_id.is_none_or(|allowed| allowed == user_id)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::Config {
                message: format!("Invalid value for {name}: {e}"),
            })
        })
        .transpose()
}

/// Loads settings from `./config.toml` (when present) and the process environment.
pub fn load_settings() -> Result<Settings> {
    let path = Path::new("config.toml");
    let base = if path.exists() {
        debug!("Loading settings from {}", path.display());
        Settings::from_file(path)?
    } else {
        debug!("No config.toml found, using defaults");
        Settings::default()
    };

    let settings = base.apply_overrides(|name| std::env::var(name).ok())?;
    info!(
        "Settings loaded (session TTL {}m, DB timeout {}s, private mode: {})",
        settings.session_ttl_minutes,
        settings.persistence_timeout_secs,
        settings.allowed_user_id.is_some()
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml_str = r#"
            database_url = "sqlite://tracker.sqlite"
            history_limit = 25
        "#;

        let settings = Settings::from_toml_str(toml_str).unwrap();
        assert_eq!(settings.database_url, "sqlite://tracker.sqlite");
        assert_eq!(settings.history_limit, 25);
        assert_eq!(settings.session_ttl_minutes, 60);
        assert_eq!(settings.allowed_user_id, None);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let result = Settings::from_toml_str("history_limit = \"many\"");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_environment_overrides_file() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_TTL_MINUTES", "5"),
            ("ALLOWED_USER_ID", "42"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::default()
            .apply_overrides(|name| vars.get(name).map(ToString::to_string))
            .unwrap();

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.session_ttl_minutes, 5);
        assert_eq!(settings.allowed_user_id, Some(42));
        assert_eq!(settings.persistence_timeout_secs, 10);
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        let result = Settings::default().apply_overrides(|name| {
            (name == "PERSISTENCE_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = Settings::default()
            .apply_overrides(|name| (name == "SESSION_TTL_MINUTES").then(|| "0".to_string()));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_private_mode() {
        let open = Settings::default();
        assert!(open.is_allowed(1));

        let private = Settings {
            allowed_user_id: Some(7),
            ..Settings::default()
        };
        assert!(private.is_allowed(7));
        assert!(!private.is_allowed(8));
    }
}
