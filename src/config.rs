use std::path::PathBuf;

use tracing::{debug, info};

use crate::progress::{ProgressError, RuleTables};

pub const RULES_PATH_VAR: &str = "HABITMASTER_RULES_PATH";
pub const DEMO_USERS_VAR: &str = "HABITMASTER_DEMO_USERS";
pub const DEMO_DAYS_VAR: &str = "HABITMASTER_DEMO_DAYS";

/// Engine configuration read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub rules_path: Option<PathBuf>,
    pub demo_users: usize,
    pub demo_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            demo_users: 4,
            demo_days: 21,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ProgressError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProgressError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rules_path = lookup(RULES_PATH_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);
        let demo_users = parse_or(&lookup, DEMO_USERS_VAR, defaults.demo_users)?;
        let demo_days = parse_or(&lookup, DEMO_DAYS_VAR, defaults.demo_days)?;

        Ok(Self {
            rules_path,
            demo_users,
            demo_days,
        })
    }

    /// Rule tables from `rules_path`, or the built-in defaults.
    pub fn load_rules(&self) -> Result<RuleTables, ProgressError> {
        match &self.rules_path {
            Some(path) => {
                info!(path = %path.display(), "Loading rule tables from file");
                RuleTables::from_path(path)
            }
            None => {
                debug!("Using built-in rule tables");
                Ok(RuleTables::default())
            }
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ProgressError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ProgressError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}
