//! Gate configuration.
//!
//! Loaded from TOML. Every field has a default, so an absent file yields
//! the shipped lockout policy and the standard state directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::security::lockout::LockoutPolicy;

/// State file name inside the state directory.
const SESSION_DB_FILE: &str = "session.db";

/// Top-level configuration for the auth gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Directory holding the session database.
    pub state_dir: PathBuf,
    /// Lockout tunables.
    pub lockout: LockoutConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            lockout: LockoutConfig::default(),
        }
    }
}

impl GateConfig {
    /// Load from a TOML file. An absent file yields the defaults; an
    /// unreadable or unparsable file is an explicit error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Path of the session database under the state directory.
    pub fn session_db_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_DB_FILE)
    }
}

fn default_state_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|u| u.home_dir().join(".obralink"))
        .unwrap_or_else(|| PathBuf::from(".obralink"))
}

/// Lockout policy tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failed attempts tolerated before a lockout window engages.
    pub threshold: u32,
    /// Escalating lockout windows in seconds; the last entry repeats.
    pub backoff_secs: Vec<u64>,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            backoff_secs: vec![30, 60, 300, 900],
        }
    }
}

impl LockoutConfig {
    /// Build the pure policy from the configured tunables.
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(
            self.threshold,
            self.backoff_secs.iter().map(|s| s * 1_000).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_shipped_policy() {
        let config = GateConfig::default();
        assert_eq!(config.lockout.threshold, 3);
        assert_eq!(config.lockout.backoff_secs, vec![30, 60, 300, 900]);
        assert!(config.session_db_path().ends_with("session.db"));
    }

    #[test]
    fn absent_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = GateConfig::load(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config, GateConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gate.toml");
        std::fs::write(&path, "[lockout]\nthreshold = 5\n").unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.lockout.threshold, 5);
        assert_eq!(config.lockout.backoff_secs, vec![30, 60, 300, 900]);
        assert_eq!(config.state_dir, GateConfig::default().state_dir);
    }

    #[test]
    fn full_file_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gate.toml");
        let mut config = GateConfig::default();
        config.state_dir = PathBuf::from("/tmp/obralink-test");
        config.lockout.backoff_secs = vec![10, 20];

        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(GateConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_explicit_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gate.toml");
        std::fs::write(&path, "lockout = \"not a table\"").unwrap();

        assert!(GateConfig::load(&path).is_err());
    }

    #[test]
    fn configured_policy_converts_seconds() {
        let config = LockoutConfig {
            threshold: 2,
            backoff_secs: vec![1, 5],
        };
        let policy = config.policy();
        assert_eq!(policy.record_failure(1, 0).1, Some(1_000));
        assert_eq!(policy.record_failure(2, 0).1, Some(5_000));
    }
}
