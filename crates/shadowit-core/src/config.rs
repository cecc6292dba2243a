//! Guard configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use shadowit_enforcement::EnforcementSettings;
use shadowit_policy::{default_rules, Rule, DEFAULT_REQUESTS_KEY, DEFAULT_RULES_KEY};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Storage key holding the rule list
    pub rules_key: String,
    /// Storage key holding the requested sites
    pub requests_key: String,
    /// Rules seeded when none are stored
    pub default_rules: Vec<Rule>,
    /// Countdown shown after an access request
    pub countdown_seconds: u32,
    pub countdown_tick_ms: u64,
    /// How long the popup's URL popper stays up
    pub popper_timeout_ms: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("shadowit.db"),
            rules_key: DEFAULT_RULES_KEY.to_string(),
            requests_key: DEFAULT_REQUESTS_KEY.to_string(),
            default_rules: default_rules(),
            countdown_seconds: 3,
            countdown_tick_ms: 1000,
            popper_timeout_ms: 5000,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Shadowit"))
            .unwrap_or_else(|| PathBuf::from(".shadowit"))
    }

    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules_key.is_empty() || self.requests_key.is_empty() {
            return Err(CoreError::Config("storage keys must not be empty".to_string()));
        }
        if self.rules_key == self.requests_key {
            return Err(CoreError::Config(format!(
                "rules and requests share the key {:?}",
                self.rules_key
            )));
        }
        if self.countdown_tick_ms == 0 {
            return Err(CoreError::Config("countdown tick must be positive".to_string()));
        }
        Ok(())
    }

    pub fn enforcement_settings(&self) -> EnforcementSettings {
        EnforcementSettings {
            countdown_seconds: self.countdown_seconds,
            tick: Duration::from_millis(self.countdown_tick_ms),
        }
    }

    pub fn popper_timeout(&self) -> Duration {
        Duration::from_millis(self.popper_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/shadowit"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/shadowit/shadowit.db"));
        assert_eq!(config.rules_key, "siteRules");
        assert_eq!(config.requests_key, "requestedAccess");
        assert_eq!(config.default_rules.len(), 2);
        assert_eq!(config.enforcement_settings(), EnforcementSettings::default());
        assert_eq!(config.popper_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(
            r#"{"countdown_seconds": 5, "default_rules": [{"url": "reddit.com", "blocked": true}]}"#,
        )
        .unwrap();

        assert_eq!(config.countdown_seconds, 5);
        assert_eq!(config.default_rules, vec![Rule::block("reddit.com")]);
        assert_eq!(config.rules_key, "siteRules");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_json(r#"{"rules_key": "same", "requests_key": "same"}"#),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"countdown_tick_ms": 0}"#),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_json("42"),
            Err(CoreError::Serialization(_))
        ));
    }
}
