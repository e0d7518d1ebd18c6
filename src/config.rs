use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::classify::{RuleTable, DEFAULT_PROFILE};
use crate::pipeline::store::DEFAULT_STORE_CONCURRENCY;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Optional JSON rule table replacing the built-in one
    pub rules_path: Option<PathBuf>,
    /// Scoring profile used when a command doesn't name one
    pub profile: String,
    /// Concurrent writes during best-effort storage
    pub store_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./coastwatch.db".to_string(),
            rules_path: None,
            profile: DEFAULT_PROFILE.to_string(),
            store_concurrency: DEFAULT_STORE_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default, so this only fails on malformed values.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let store_concurrency = match env::var("COASTWATCH_STORE_CONCURRENCY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("COASTWATCH_STORE_CONCURRENCY must be a number, got '{raw}'"))?,
            Err(_) => defaults.store_concurrency,
        };
        if store_concurrency == 0 {
            anyhow::bail!("COASTWATCH_STORE_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            db_path: env::var("COASTWATCH_DB_PATH").unwrap_or(defaults.db_path),
            rules_path: env::var("COASTWATCH_RULES")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            profile: env::var("COASTWATCH_PROFILE")
                .ok()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.profile),
            store_concurrency,
        })
    }

    /// The active rule table: the configured JSON file, or the built-in table.
    pub fn rule_table(&self) -> Result<RuleTable> {
        match self.rules_path {
            Some(ref path) => RuleTable::load(path),
            None => Ok(RuleTable::builtin()),
        }
    }

    /// Check that the database has been created.
    /// Call this before any operation that reads stored posts.
    pub fn require_database(&self) -> Result<()> {
        if !Path::new(&self.db_path).exists() {
            anyhow::bail!(
                "Database not found at {}. Run `coastwatch init` first,\n\
                 or set COASTWATCH_DB_PATH in your .env file.",
                self.db_path
            );
        }
        Ok(())
    }

    /// Check that the configured default profile exists in the rule table.
    pub fn require_profile(&self, table: &RuleTable) -> Result<()> {
        table
            .profile(&self.profile)
            .map(|_| ())
            .context("COASTWATCH_PROFILE names a profile the rule table doesn't define")
    }
}
