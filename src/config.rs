//! Configuration loading for Vigil
//!
//! Configuration is layered: an optional `vigil.toml` parsed with serde,
//! then environment variable overrides, then validation. The result is a
//! single immutable [`Config`] value constructed at startup and passed by
//! reference into each component.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Load configuration from an optional TOML file plus process environment.
///
/// A missing file is not an error: every setting has a default and can be
/// supplied through environment variables alone, which is how cron
/// deployments typically configure the agent.
pub fn load(path: &Path) -> Result<Config> {
    load_with(path, |name| std::env::var(name).ok())
}

/// Load configuration with an explicit environment lookup.
pub fn load_with<F>(path: &Path, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content)?
    } else {
        Config::baseline()
    };

    config.apply_env(&lookup)?;
    config.validate()?;

    Ok(config)
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hostname shown in notifications (defaults to the machine hostname)
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Per-resource alert thresholds in percent
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Number of consecutive samples a resource must breach before alerting
    #[serde(default = "default_check_count")]
    pub check_count: u32,

    /// Seconds to sleep between samples within a polling window
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Recovery command configuration
    #[serde(default)]
    pub recovery: RecoverySettings,

    /// Webhook endpoints per channel
    #[serde(default)]
    pub webhooks: WebhookSettings,

    /// Network reachability probe configuration
    #[serde(default)]
    pub network: NetworkSettings,

    /// Log output configuration
    #[serde(default)]
    pub log: LogSettings,

    /// Simulate all side effects (set from the CLI, never from config)
    #[serde(skip)]
    pub test_mode: bool,
}

impl Config {
    /// All-defaults configuration, before environment overrides.
    pub fn baseline() -> Config {
        Config {
            hostname: default_hostname(),
            thresholds: Thresholds::default(),
            check_count: default_check_count(),
            check_interval: default_check_interval(),
            recovery: RecoverySettings::default(),
            webhooks: WebhookSettings::default(),
            network: NetworkSettings::default(),
            log: LogSettings::default(),
            test_mode: false,
        }
    }

    /// Apply environment variable overrides on top of the file layer.
    fn apply_env<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CUSTOM_HOSTNAME") {
            self.hostname = value;
        }

        override_parse(lookup, "CPU_THRESHOLD", &mut self.thresholds.cpu)?;
        override_parse(lookup, "MEMORY_THRESHOLD", &mut self.thresholds.memory)?;
        override_parse(lookup, "SWAP_THRESHOLD", &mut self.thresholds.swap)?;
        override_parse(lookup, "DISK_THRESHOLD", &mut self.thresholds.disk)?;

        override_parse(lookup, "CHECK_COUNT", &mut self.check_count)?;
        override_parse(lookup, "CHECK_INTERVAL", &mut self.check_interval)?;

        if let Some(value) = lookup("RECOVERY_COMMANDS") {
            self.recovery.commands = value;
        }
        override_parse(lookup, "RECOVERY_WAIT_TIME", &mut self.recovery.wait_secs)?;

        if let Some(value) = lookup("FEISHU_WEBHOOK_URL") {
            self.webhooks.feishu_url = value;
        }
        if let Some(value) = lookup("SLACK_WEBHOOK_URL") {
            self.webhooks.slack_url = value;
        }
        if let Some(value) = lookup("MATTERMOST_WEBHOOK_URL") {
            self.webhooks.mattermost_url = value;
        }

        if let Some(value) = lookup("NETWORK_CHECK_TARGET") {
            self.network.target = value;
        }
        override_parse(lookup, "NETWORK_TIMEOUT", &mut self.network.timeout_secs)?;
        override_parse(lookup, "MAX_RETRY", &mut self.network.max_retry)?;
        override_parse(lookup, "RETRY_INTERVAL", &mut self.network.retry_interval_secs)?;

        if let Some(value) = lookup("LOG_FILE") {
            self.log.file = PathBuf::from(value);
        }
        if let Some(value) = lookup("RUNNING_FROM_CRON") {
            self.log.from_cron = value == "true";
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cpu", self.thresholds.cpu),
            ("memory", self.thresholds.memory),
            ("swap", self.thresholds.swap),
            ("disk", self.thresholds.disk),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::ConfigValidation(format!(
                    "{} threshold {} is outside 0-100",
                    name, value
                )));
            }
        }

        if self.network.target.is_empty() {
            return Err(Error::ConfigValidation(
                "network check target must not be empty".into(),
            ));
        }

        if self.network.max_retry == 0 {
            return Err(Error::ConfigValidation(
                "network max_retry must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Whether at least one webhook channel is configured
    pub fn has_webhooks(&self) -> bool {
        !self.webhooks.feishu_url.is_empty()
            || !self.webhooks.slack_url.is_empty()
            || !self.webhooks.mattermost_url.is_empty()
    }
}

fn override_parse<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(value) = lookup(name) {
        *slot = value.parse().map_err(|_| Error::ConfigValue {
            name: name.to_string(),
            value,
        })?;
    }
    Ok(())
}

fn default_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".into())
}

fn default_check_count() -> u32 {
    3
}

fn default_check_interval() -> u64 {
    60
}

/// Per-resource alert thresholds in percent
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_cpu_threshold")]
    pub cpu: f64,

    #[serde(default = "default_memory_threshold")]
    pub memory: f64,

    #[serde(default = "default_swap_threshold")]
    pub swap: f64,

    #[serde(default = "default_disk_threshold")]
    pub disk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: default_cpu_threshold(),
            memory: default_memory_threshold(),
            swap: default_swap_threshold(),
            disk: default_disk_threshold(),
        }
    }
}

fn default_cpu_threshold() -> f64 {
    90.0
}

fn default_memory_threshold() -> f64 {
    85.0
}

fn default_swap_threshold() -> f64 {
    80.0
}

fn default_disk_threshold() -> f64 {
    90.0
}

/// Recovery command configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecoverySettings {
    /// Remediation commands as a single `;`-delimited string
    #[serde(default)]
    pub commands: String,

    /// Seconds to wait after recovery before reverifying
    #[serde(default = "default_recovery_wait")]
    pub wait_secs: u64,
}

impl RecoverySettings {
    /// Split the configured command string into individual commands
    pub fn command_list(&self) -> Vec<String> {
        self.commands
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_recovery_wait() -> u64 {
    60
}

/// Webhook endpoints per channel (empty string disables a channel)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookSettings {
    #[serde(default)]
    pub feishu_url: String,

    #[serde(default)]
    pub slack_url: String,

    #[serde(default)]
    pub mattermost_url: String,
}

/// Network reachability probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// Target URL for the reachability probe
    #[serde(default = "default_network_target")]
    pub target: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout_secs: u64,

    /// Total probe attempts before declaring the network down
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Fixed sleep between probe attempts in seconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            target: default_network_target(),
            timeout_secs: default_network_timeout(),
            max_retry: default_max_retry(),
            retry_interval_secs: default_retry_interval(),
        }
    }
}

fn default_network_target() -> String {
    "https://www.google.com".into()
}

fn default_network_timeout() -> u64 {
    5
}

fn default_max_retry() -> u32 {
    5
}

fn default_retry_interval() -> u64 {
    10
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Log file path
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Suppress the stdout layer (set by cron wrappers)
    #[serde(default)]
    pub from_cron: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            from_cron: false,
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/var/log/vigil.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_name: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_baseline_defaults() {
        let config = Config::baseline();
        assert_eq!(config.thresholds.cpu, 90.0);
        assert_eq!(config.thresholds.memory, 85.0);
        assert_eq!(config.thresholds.swap, 80.0);
        assert_eq!(config.thresholds.disk, 90.0);
        assert_eq!(config.check_count, 3);
        assert_eq!(config.check_interval, 60);
        assert_eq!(config.recovery.wait_secs, 60);
        assert_eq!(config.network.max_retry, 5);
        assert!(!config.has_webhooks());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_layer() {
        let toml = r#"
hostname = "web-01"
check_count = 5

[thresholds]
cpu = 95.0

[webhooks]
slack_url = "https://hooks.slack.example/T000/B000"

[recovery]
commands = "systemctl restart nginx; rm -f /tmp/nginx.lock"
wait_secs = 30
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.hostname, "web-01");
        assert_eq!(config.check_count, 5);
        assert_eq!(config.thresholds.cpu, 95.0);
        // Unset fields keep their defaults
        assert_eq!(config.thresholds.memory, 85.0);
        assert!(config.has_webhooks());
        assert_eq!(
            config.recovery.command_list(),
            vec!["systemctl restart nginx", "rm -f /tmp/nginx.lock"]
        );
        assert_eq!(config.recovery.wait_secs, 30);
    }

    #[test]
    fn test_env_overrides_file_layer() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CPU_THRESHOLD", "75.5"),
            ("CHECK_COUNT", "2"),
            ("CUSTOM_HOSTNAME", "db-02"),
            ("MATTERMOST_WEBHOOK_URL", "https://mm.example/hooks/abc"),
            ("RUNNING_FROM_CRON", "true"),
        ]);
        let lookup = |name: &str| env.get(name).map(|v| v.to_string());

        let mut config = Config::baseline();
        config.apply_env(&lookup).unwrap();

        assert_eq!(config.thresholds.cpu, 75.5);
        assert_eq!(config.check_count, 2);
        assert_eq!(config.hostname, "db-02");
        assert_eq!(config.webhooks.mattermost_url, "https://mm.example/hooks/abc");
        assert!(config.log.from_cron);
    }

    #[test]
    fn test_invalid_numeric_env_is_rejected() {
        let lookup = |name: &str| {
            (name == "CHECK_COUNT").then(|| "three".to_string())
        };

        let mut config = Config::baseline();
        let err = config.apply_env(&lookup).unwrap_err();
        assert!(matches!(err, Error::ConfigValue { .. }));
    }

    #[test]
    fn test_threshold_out_of_range_error() {
        let mut config = Config::baseline();
        config.thresholds.disk = 130.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retry_budget_error() {
        let mut config = Config::baseline();
        config.network.max_retry = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_command_string_yields_no_commands() {
        let recovery = RecoverySettings::default();
        assert!(recovery.command_list().is_empty());

        let spaced = RecoverySettings {
            commands: " ; ;; ".into(),
            wait_secs: 60,
        };
        assert!(spaced.command_list().is_empty());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_with(Path::new("/nonexistent/vigil.toml"), no_env).unwrap();
        assert_eq!(config.check_count, 3);
    }
}
