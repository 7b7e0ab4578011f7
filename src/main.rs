//! Vigil - host resource monitor with webhook alerting
//!
//! Samples host resource usage over a fixed polling window, alerts chat
//! webhooks on sustained threshold breaches, runs configured recovery
//! commands, and reports recovery status. Each invocation performs exactly
//! one cycle; scheduling repeated runs belongs to cron.

mod cli;
mod config;
mod error;
mod logging;
mod monitor;
mod netcheck;
mod notify;
mod recovery;
mod stats;

use cli::{Cli, Commands};
use error::Result;
use monitor::MonitorRunner;
use notify::Dispatcher;
use recovery::RecoveryExecutor;
use stats::SystemSampler;
use tracing::{error, info, warn};

fn main() {
    let cli = Cli::parse_args();

    if let Commands::Completion { shell } = &cli.command {
        Cli::generate_completion(*shell);
        return;
    }

    let config = config::load(&cli.config);

    // Logging wants the configured file path, so config loads first and a
    // load failure falls back to environment-derived log settings.
    let log_settings = match &config {
        Ok(c) => c.log.clone(),
        Err(_) => fallback_log_settings(),
    };
    let _guards = logging::init(&log_settings, cli.verbose);

    // Every top-level error is logged and swallowed; the process always
    // exits 0 so a failing check cannot crash-loop under cron.
    match config {
        Ok(config) => {
            if let Err(e) = run(cli, config) {
                error!(error = %e, "monitoring run failed");
            }
        }
        Err(e) => {
            error!(error = %e, "configuration error");
        }
    }
}

/// Log settings used when the configuration itself failed to load
fn fallback_log_settings() -> config::LogSettings {
    let mut settings = config::LogSettings::default();
    if let Ok(file) = std::env::var("LOG_FILE") {
        settings.file = file.into();
    }
    if std::env::var("RUNNING_FROM_CRON").is_ok_and(|v| v == "true") {
        settings.from_cron = true;
    }
    settings
}

fn run(cli: Cli, mut config: config::Config) -> Result<()> {
    match cli.command {
        Commands::Check { test } => {
            config.test_mode = test;
            if test {
                info!("running in TEST MODE, side effects are simulated");
            }
            info!(hostname = %config.hostname, "starting server resource check");

            if !config.has_webhooks() {
                warn!("no notification webhooks configured");
            }
            if config.recovery.command_list().is_empty() {
                warn!("no recovery commands configured, alerts will not trigger remediation");
            }

            let dispatcher = Dispatcher::from_config(&config);
            let executor = RecoveryExecutor::new(config.test_mode);
            let mut runner =
                MonitorRunner::new(&config, SystemSampler::new(), executor, dispatcher);

            let report = runner.run()?;
            info!(
                alerts = report.alerts.len(),
                notified = report.notified,
                recovery_success = ?report.recovery.as_ref().map(|o| o.success()),
                recovered = ?report.recovered(),
                "resource check complete"
            );
            Ok(())
        }

        Commands::Network { test } => {
            config.test_mode = test;
            if test {
                info!("running in TEST MODE, side effects are simulated");
            }
            info!(target = %config.network.target, "starting network connectivity check");

            if !config.has_webhooks() {
                warn!("no notification webhooks configured");
            }

            let dispatcher = Dispatcher::from_config(&config);
            let report = netcheck::run_network_check(&config, &netcheck::HttpProbe, &dispatcher);
            info!(
                up = report.up,
                attempts = report.attempts,
                notified = report.notified,
                detail = %report.detail,
                "network check complete"
            );
            Ok(())
        }

        Commands::Config { show } => {
            // Reaching this point means load() already validated the config
            println!("Configuration valid.");
            if show {
                print_config(&config);
            }
            Ok(())
        }

        // Handled before config load
        Commands::Completion { .. } => unreachable!(),
    }
}

/// Print the effective configuration as TOML
fn print_config(config: &config::Config) {
    println!();
    println!("hostname = \"{}\"", config.hostname);
    println!("check_count = {}", config.check_count);
    println!("check_interval = {}", config.check_interval);
    println!();
    println!("[thresholds]");
    println!("cpu = {}", config.thresholds.cpu);
    println!("memory = {}", config.thresholds.memory);
    println!("swap = {}", config.thresholds.swap);
    println!("disk = {}", config.thresholds.disk);
    println!();
    println!("[recovery]");
    println!("commands = \"{}\"", config.recovery.commands);
    println!("wait_secs = {}", config.recovery.wait_secs);
    println!();
    println!("[webhooks]");
    println!("feishu_url = \"{}\"", config.webhooks.feishu_url);
    println!("slack_url = \"{}\"", config.webhooks.slack_url);
    println!("mattermost_url = \"{}\"", config.webhooks.mattermost_url);
    println!();
    println!("[network]");
    println!("target = \"{}\"", config.network.target);
    println!("timeout_secs = {}", config.network.timeout_secs);
    println!("max_retry = {}", config.network.max_retry);
    println!("retry_interval_secs = {}", config.network.retry_interval_secs);
    println!();
    println!("[log]");
    println!("file = \"{}\"", config.log.file.display());
    println!("from_cron = {}", config.log.from_cron);
}
