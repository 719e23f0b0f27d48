//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

use super::types::{Res, Void};

/// Default record store endpoint (in-memory SurrealDB).
fn default_db_endpoint() -> String {
    "mem://".to_string()
}

/// Default record store namespace.
fn default_db_namespace() -> String {
    "triage".to_string()
}

/// Default record store database.
fn default_db_database() -> String {
    "sync".to_string()
}

/// Default fallback message shown when the support channel is down.
pub fn default_fallback_message() -> String {
    "Our support team is temporarily unavailable. Your request has been recorded and we will get back to you as soon as possible.".to_string()
}

fn default_critical_keywords() -> Vec<String> {
    ["payment", "account blocked", "account locked", "fraud", "outage", "charged twice"].into_iter().map(String::from).collect()
}

fn default_medium_keywords() -> Vec<String> {
    ["delivery", "address", "app", "login", "refund", "order"].into_iter().map(String::from).collect()
}

fn default_critical_triage_bound() -> Duration {
    Duration::from_secs(60)
}

fn default_critical_first_response_bound() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_general_response_bound() -> Duration {
    Duration::from_secs(2 * 60 * 60)
}

fn default_realtime_sync_bound() -> Duration {
    Duration::from_secs(10)
}

fn default_bulk_sync_window() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_critical_compliance_target() -> f64 {
    0.85
}

fn default_general_compliance_target() -> f64 {
    0.95
}

fn default_bulk_compliance_target() -> f64 {
    0.95
}

fn default_sync_max_attempts() -> u32 {
    5
}

fn default_sync_backoff() -> Duration {
    Duration::from_secs(2)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Configuration for the triage-sync application.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inner: Arc::new(ConfigInner::default()),
        }
    }
}

/// Configuration values, read from `TRIAGE_SYNC_*` variables and the config file.
#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Record store endpoint, `mem://` or `ws://host:port` (`DB_ENDPOINT`).
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Record store namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Record store database (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Record store username, remote endpoints only (`DB_USERNAME`).
    #[serde(default)]
    pub db_username: Option<String>,
    /// Record store password, remote endpoints only (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,

    /// Upstream support channel URL (`SUPPORT_ENDPOINT`).
    /// When unset, every ticket receives the fallback response.
    #[serde(default)]
    pub support_endpoint: Option<String>,
    /// Inventory sync target URL (`SYNC_ENDPOINT`).
    /// When unset, records are reconciled into the store only.
    #[serde(default)]
    pub sync_endpoint: Option<String>,
    /// Timeout for calls to the support channel and the sync target, in seconds (`HTTP_TIMEOUT`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: Duration,

    /// Message returned to the customer when the support channel fails (`FALLBACK_MESSAGE`).
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// Category keywords that classify a ticket as critical (`CRITICAL_KEYWORDS`).
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: Vec<String>,
    /// Category keywords that classify a ticket as medium (`MEDIUM_KEYWORDS`).
    #[serde(default = "default_medium_keywords")]
    pub medium_keywords: Vec<String>,

    /// Initial triage bound for critical tickets, in seconds (`CRITICAL_TRIAGE_BOUND`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_critical_triage_bound")]
    pub critical_triage_bound: Duration,
    /// First-response bound for critical tickets, in seconds (`CRITICAL_FIRST_RESPONSE_BOUND`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_critical_first_response_bound")]
    pub critical_first_response_bound: Duration,
    /// Response bound for medium and low tickets, in seconds (`GENERAL_RESPONSE_BOUND`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_general_response_bound")]
    pub general_response_bound: Duration,
    /// Operator target for critical batches (`CRITICAL_COMPLIANCE_TARGET`).
    #[serde(default = "default_critical_compliance_target")]
    pub critical_compliance_target: f64,
    /// Operator target for general batches (`GENERAL_COMPLIANCE_TARGET`).
    #[serde(default = "default_general_compliance_target")]
    pub general_compliance_target: f64,

    /// Maximum accepted sync latency for a single record, in seconds (`REALTIME_SYNC_BOUND`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_realtime_sync_bound")]
    pub realtime_sync_bound: Duration,
    /// Window a bulk load must reconcile within, in seconds (`BULK_SYNC_WINDOW`).
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_bulk_sync_window")]
    pub bulk_sync_window: Duration,
    /// Operator target for bulk loads (`BULK_COMPLIANCE_TARGET`).
    #[serde(default = "default_bulk_compliance_target")]
    pub bulk_compliance_target: f64,
    /// Attempt cap for a single record sync (`SYNC_MAX_ATTEMPTS`).
    #[serde(default = "default_sync_max_attempts")]
    pub sync_max_attempts: u32,
    /// Wait between sync attempts, in milliseconds (`SYNC_BACKOFF`).
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_sync_backoff")]
    pub sync_backoff: Duration,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            db_endpoint: default_db_endpoint(),
            db_namespace: default_db_namespace(),
            db_database: default_db_database(),
            db_username: None,
            db_password: None,
            support_endpoint: None,
            sync_endpoint: None,
            http_timeout: default_http_timeout(),
            fallback_message: default_fallback_message(),
            critical_keywords: default_critical_keywords(),
            medium_keywords: default_medium_keywords(),
            critical_triage_bound: default_critical_triage_bound(),
            critical_first_response_bound: default_critical_first_response_bound(),
            general_response_bound: default_general_response_bound(),
            critical_compliance_target: default_critical_compliance_target(),
            general_compliance_target: default_general_compliance_target(),
            realtime_sync_bound: default_realtime_sync_bound(),
            bulk_sync_window: default_bulk_sync_window(),
            bulk_compliance_target: default_bulk_compliance_target(),
            sync_max_attempts: default_sync_max_attempts(),
            sync_backoff: default_sync_backoff(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration.
    ///
    /// Environment variables are read first, then `explicit_path` or
    /// `.hidden/config.toml` if it exists.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let env = config::Environment::default()
            .prefix("TRIAGE_SYNC")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("critical_keywords")
            .with_list_parse_key("medium_keywords");

        let mut cfg = config::Config::builder().add_source(env);

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the cross-field constraints that `serde` cannot express.
    pub fn validate(&self) -> Void {
        if self.fallback_message.trim().is_empty() {
            return Err(anyhow::anyhow!("Fallback message must not be empty."));
        }

        if self.critical_triage_bound > self.critical_first_response_bound {
            return Err(anyhow::anyhow!("Critical triage bound must not exceed the critical first-response bound."));
        }

        if self.critical_first_response_bound > self.general_response_bound {
            return Err(anyhow::anyhow!("Critical first-response bound must not exceed the general response bound."));
        }

        if self.realtime_sync_bound > self.bulk_sync_window {
            return Err(anyhow::anyhow!("Realtime sync bound must not exceed the bulk sync window."));
        }

        for (name, target) in [
            ("critical", self.critical_compliance_target),
            ("general", self.general_compliance_target),
            ("bulk", self.bulk_compliance_target),
        ] {
            if !(target > 0.0 && target <= 1.0) {
                return Err(anyhow::anyhow!("The {name} compliance target must be in (0, 1]."));
            }
        }

        if self.sync_max_attempts < 1 || self.sync_max_attempts > 100 {
            return Err(anyhow::anyhow!("Sync max attempts must be between 1 and 100."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(f: impl FnOnce(&mut ConfigInner)) -> Config {
        let mut inner = ConfigInner::default();
        f(&mut inner);
        Config { inner: Arc::new(inner) }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();

        config.validate().unwrap();
        assert_eq!(config.critical_triage_bound, Duration::from_secs(60));
        assert_eq!(config.sync_max_attempts, 5);
        assert_eq!(config.db_endpoint, "mem://");
    }

    #[test]
    fn test_rejects_blank_fallback_message() {
        let config = config_with(|c| c.fallback_message = "   ".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = config_with(|c| c.critical_triage_bound = Duration::from_secs(3600));
        assert!(config.validate().is_err());

        let config = config_with(|c| c.realtime_sync_bound = Duration::from_secs(600));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_targets_and_attempts() {
        assert!(config_with(|c| c.bulk_compliance_target = 1.5).validate().is_err());
        assert!(config_with(|c| c.critical_compliance_target = 0.0).validate().is_err());
        assert!(config_with(|c| c.sync_max_attempts = 0).validate().is_err());
    }

    #[test]
    fn test_load_reads_toml_file() {
        let path = std::env::temp_dir().join(format!("triage-sync-config-{}.toml", std::process::id()));
        std::fs::write(&path, "sync_max_attempts = 3\nsync_backoff = 250\ncritical_keywords = [\"chargeback\"]\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.sync_max_attempts, 3);
        assert_eq!(config.sync_backoff, Duration::from_millis(250));
        assert_eq!(config.critical_keywords, vec!["chargeback".to_string()]);
        assert_eq!(config.general_response_bound, Duration::from_secs(7200));
    }
}
