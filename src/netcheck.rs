//! Network reachability checking
//!
//! Provides:
//! - A single-shot HTTP probe against a configured target
//! - Bounded retries with a fixed sleep between attempts
//! - A "network down" notification only after the retry budget is spent

use crate::config::Config;
use crate::notify::{Dispatcher, Message, Section, Severity, TIMESTAMP_FORMAT};
use chrono::Local;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a single probe attempt
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub up: bool,
    /// Human-readable description carried into logs and notifications
    pub detail: String,
}

/// Reachability probe seam, mockable in tests
pub trait Probe {
    fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// Probe backed by a ureq HEAD request.
///
/// Redirects are followed; any 2xx/3xx final status counts as "up".
pub struct HttpProbe;

impl Probe for HttpProbe {
    fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        match agent.head(url).call() {
            Ok(response) => ProbeOutcome {
                up: true,
                detail: format!(
                    "HTTP request to {} successful (Status code: {})",
                    url,
                    response.status().as_u16()
                ),
            },
            Err(ureq::Error::StatusCode(code)) if (200..400).contains(&code) => ProbeOutcome {
                up: true,
                detail: format!(
                    "HTTP request to {} successful (Status code: {})",
                    url, code
                ),
            },
            Err(ureq::Error::StatusCode(code)) => ProbeOutcome {
                up: false,
                detail: format!("HTTP request to {} failed (Status code: {})", url, code),
            },
            Err(e) => ProbeOutcome {
                up: false,
                detail: format!("HTTP request to {} failed: {}", url, e),
            },
        }
    }
}

/// Report of a full reachability check including retries
#[derive(Debug)]
pub struct NetworkReport {
    pub up: bool,
    pub attempts: u32,
    pub detail: String,
    pub notified: bool,
}

/// Run the reachability check with the configured retry budget.
///
/// A success short-circuits the remaining attempts. Only a failure that
/// survives every attempt produces a notification; "up" results notify
/// only in diagnostic test mode.
pub fn run_network_check<P: Probe>(
    config: &Config,
    probe: &P,
    dispatcher: &Dispatcher,
) -> NetworkReport {
    let target = &config.network.target;
    let timeout = Duration::from_secs(config.network.timeout_secs);
    let max_retry = config.network.max_retry;

    let mut attempts = 0;
    let outcome = loop {
        attempts += 1;
        info!(target = %target, attempt = attempts, "checking network connectivity");

        let outcome = probe.probe(target, timeout);
        if outcome.up || attempts >= max_retry {
            break outcome;
        }

        info!(
            attempt = attempts,
            max_retry,
            retry_in = config.network.retry_interval_secs,
            "network check failed, retrying"
        );
        thread::sleep(Duration::from_secs(config.network.retry_interval_secs));
    };

    let mut notified = false;

    if outcome.up {
        info!(detail = %outcome.detail, "network connectivity is up");
        if config.test_mode {
            notified = dispatcher.dispatch(&status_message(config, &outcome));
        }
    } else {
        warn!(detail = %outcome.detail, "network connectivity is down, sending alert");
        notified = dispatcher.dispatch(&status_message(config, &outcome));
    }

    NetworkReport {
        up: outcome.up,
        attempts,
        detail: outcome.detail,
        notified,
    }
}

fn status_message(config: &Config, outcome: &ProbeOutcome) -> Message {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    if outcome.up {
        Message::new(
            format!("Network Up - {}", config.hostname),
            Severity::Info,
            timestamp,
        )
        .section(Section::lead("Network connectivity verified:").item(&outcome.detail))
    } else {
        Message::new(
            format!("Network Down - {}", config.hostname),
            Severity::Critical,
            timestamp,
        )
        .section(Section::lead("Network connectivity issue detected:").item(&outcome.detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingTransport;
    use std::cell::RefCell;

    /// Probe that replays a scripted sequence of up/down outcomes
    struct ScriptedProbe {
        outcomes: RefCell<Vec<bool>>,
    }

    impl ScriptedProbe {
        fn new(outcomes: Vec<bool>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
            }
        }
    }

    impl Probe for ScriptedProbe {
        fn probe(&self, url: &str, _timeout: Duration) -> ProbeOutcome {
            let mut outcomes = self.outcomes.borrow_mut();
            let up = if outcomes.is_empty() {
                false
            } else {
                outcomes.remove(0)
            };
            ProbeOutcome {
                up,
                detail: format!("HTTP request to {} scripted", url),
            }
        }
    }

    fn test_config() -> Config {
        let mut config = Config::baseline();
        config.hostname = "web-01".into();
        config.network.max_retry = 3;
        config.network.retry_interval_secs = 0;
        config.webhooks.mattermost_url = "https://mm.example/hook".into();
        config
    }

    #[test]
    fn test_success_short_circuits_retries() {
        let config = test_config();
        let probe = ScriptedProbe::new(vec![true]);
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        let report = run_network_check(&config, &probe, &dispatcher);

        assert!(report.up);
        assert_eq!(report.attempts, 1);
        assert!(!report.notified);
        assert!(posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_recovery_within_retry_budget_stays_quiet() {
        let config = test_config();
        let probe = ScriptedProbe::new(vec![false, false, true]);
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        let report = run_network_check(&config, &probe, &dispatcher);

        assert!(report.up);
        assert_eq!(report.attempts, 3);
        assert!(posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_retries_notify_down() {
        let config = test_config();
        let probe = ScriptedProbe::new(vec![false, false, false]);
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        let report = run_network_check(&config, &probe, &dispatcher);

        assert!(!report.up);
        assert_eq!(report.attempts, 3);
        assert!(report.notified);

        let posts = posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let text = posts[0].1["text"].as_str().unwrap();
        assert!(text.contains("Network Down - web-01"));
        assert!(text.contains("Network connectivity issue detected:"));
    }

    #[test]
    fn test_up_result_notifies_in_test_mode_only() {
        let mut config = test_config();
        config.test_mode = true;
        let probe = ScriptedProbe::new(vec![true]);
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        let report = run_network_check(&config, &probe, &dispatcher);

        assert!(report.up);
        // Diagnostic notification is simulated, never posted
        assert!(report.notified);
        assert!(posts.lock().unwrap().is_empty());
    }
}
