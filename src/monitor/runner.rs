//! Monitoring cycle runner
//!
//! Drives one complete sample → evaluate → alert → remediate → reverify →
//! report cycle per invocation, advancing the cycle state machine as it
//! goes. Repeated scheduling is left to cron; the process exits when the
//! cycle ends.

use crate::config::Config;
use crate::error::Result;
use crate::monitor::machine::Cycle;
use crate::monitor::tracker::{AlertRecord, BreachTracker, ThresholdTable};
use crate::notify::{Dispatcher, Message, Section, Severity, TIMESTAMP_FORMAT};
use crate::recovery::{RecoveryExecutor, RecoveryOutcome};
use crate::stats::{Resource, ResourceSample, Sampler};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Process entries shown in the top-memory section of alert messages
const TOP_PROCESS_COUNT: usize = 5;

/// Summary of one completed monitoring cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Resources whose breach was sustained across the first window
    pub alerts: Vec<AlertRecord>,
    /// Whether at least one channel accepted the alert notification
    pub notified: bool,
    /// Outcome of the recovery attempt, when commands are configured
    pub recovery: Option<RecoveryOutcome>,
    /// Alert set of the reverification window, when recovery ran
    pub reverify_alerts: Option<Vec<AlertRecord>>,
}

impl CycleReport {
    /// Whether the reverification window came back clean
    pub fn recovered(&self) -> Option<bool> {
        self.reverify_alerts.as_ref().map(|alerts| alerts.is_empty())
    }
}

/// Orchestrates one monitoring cycle over injected collaborators.
pub struct MonitorRunner<'a, S: Sampler> {
    config: &'a Config,
    thresholds: ThresholdTable,
    sampler: S,
    executor: RecoveryExecutor,
    dispatcher: Dispatcher,
}

impl<'a, S: Sampler> MonitorRunner<'a, S> {
    pub fn new(
        config: &'a Config,
        sampler: S,
        executor: RecoveryExecutor,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            thresholds: ThresholdTable::from_config(&config.thresholds),
            sampler,
            executor,
            dispatcher,
        }
    }

    /// Run one full monitoring cycle.
    ///
    /// Sampling failures abort the cycle without emitting a partial alert.
    /// Notification and recovery-command failures never abort it.
    pub fn run(&mut self) -> Result<CycleReport> {
        let mut cycle = Cycle::new();
        let mut report = CycleReport::default();

        cycle.begin()?;
        let mut tracker = BreachTracker::new(&self.thresholds);
        let reference = self.collect_window(&mut tracker)?;
        cycle.windowed()?;

        let alerts = tracker.finish(self.config.check_count, &reference);
        if alerts.is_empty() {
            cycle.clear()?;
            info!("no resource issues detected");
            return Ok(report);
        }
        cycle.breach()?;

        for alert in &alerts {
            warn!(
                resource = %alert.resource,
                value = alert.value,
                threshold = alert.threshold,
                "sustained breach detected"
            );
        }

        let message = self.alert_message(&alerts, &reference);
        report.notified = self.dispatcher.dispatch(&message);
        report.alerts = alerts;

        let commands = self.config.recovery.command_list();
        if commands.is_empty() {
            cycle.alerted()?;
            warn!("no recovery commands configured, cycle ends after alerting");
            return Ok(report);
        }

        cycle.remediate()?;
        cycle.execute()?;
        let outcome = self.executor.run_all(&commands);
        cycle.reverify()?;

        if self.config.recovery.wait_secs > 0 {
            info!(
                wait_secs = self.config.recovery.wait_secs,
                "waiting before reverification"
            );
            thread::sleep(Duration::from_secs(self.config.recovery.wait_secs));
        }

        // Reverification runs a complete fresh window over all resources,
        // independent of which resources caused the original alert.
        let mut retracker = BreachTracker::new(&self.thresholds);
        let re_reference = self.collect_window(&mut retracker)?;
        cycle.rewindowed()?;
        let reverify_alerts = retracker.finish(self.config.check_count, &re_reference);
        cycle.report()?;

        let message = self.recovery_message(&reverify_alerts, &outcome, &re_reference);
        self.dispatcher.dispatch(&message);
        cycle.complete()?;

        if reverify_alerts.is_empty() {
            info!("resources recovered after remediation");
        } else {
            warn!(
                remaining = reverify_alerts.len(),
                "resources still affected after remediation"
            );
        }

        report.recovery = Some(outcome);
        report.reverify_alerts = Some(reverify_alerts);
        Ok(report)
    }

    /// Sample a full polling window into the tracker, then capture the
    /// reference sample used for alert values and the stats section.
    ///
    /// The window always runs to completion: a breach that is already
    /// certain or already interrupted still gets every remaining sample
    /// taken and logged.
    fn collect_window(&mut self, tracker: &mut BreachTracker) -> Result<ResourceSample> {
        let window = self.config.check_count;

        for tick in 0..window {
            let sample = self.sampler.sample()?;
            info!(stats = %sample.summary(), "sampled");

            for resource in tracker.observe(&sample) {
                warn!(
                    resource = %resource,
                    value = sample.value(resource),
                    "resource over threshold"
                );
            }

            if tick + 1 < window {
                thread::sleep(Duration::from_secs(self.config.check_interval));
            }
        }

        self.sampler.sample()
    }

    fn alert_message(&mut self, alerts: &[AlertRecord], reference: &ResourceSample) -> Message {
        let mut message = Message::new(
            format!("Server Resource Alert - {}", self.config.hostname),
            Severity::Critical,
            reference.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        )
        .section(
            Section::lead(format!(
                "The following resources have exceeded thresholds for {} consecutive checks:",
                self.config.check_count
            ))
            .items(alerts.iter().map(|a| a.describe())),
        );

        if alerts.iter().any(|a| a.resource == Resource::Memory) {
            let processes = self.sampler.top_memory_processes(TOP_PROCESS_COUNT);
            if !processes.is_empty() {
                message = message.section(
                    Section::titled("Top Memory Processes").items(processes.iter().map(|p| {
                        format!(
                            "{} (PID {}): Memory {:.1}%, CPU {:.1}%",
                            p.name, p.pid, p.memory_percent, p.cpu_percent
                        )
                    })),
                );
            }
        }

        message.section(stats_section(reference))
    }

    fn recovery_message(
        &self,
        reverify_alerts: &[AlertRecord],
        outcome: &RecoveryOutcome,
        reference: &ResourceSample,
    ) -> Message {
        let timestamp = reference.timestamp.format(TIMESTAMP_FORMAT).to_string();

        let message = if reverify_alerts.is_empty() {
            Message::new(
                format!("Resources Recovered - {}", self.config.hostname),
                Severity::Info,
                timestamp,
            )
            .section(Section::lead(
                "All resources are back under their thresholds after recovery.",
            ))
        } else {
            Message::new(
                format!("Resources Still Affected - {}", self.config.hostname),
                Severity::Warning,
                timestamp,
            )
            .section(
                Section::lead(
                    "The following resources remain above thresholds after recovery:",
                )
                .items(reverify_alerts.iter().map(|a| a.describe())),
            )
        };

        message
            .section(Section::titled("Recovery Commands").items(outcome.report_lines()))
            .section(stats_section(reference))
    }
}

fn stats_section(sample: &ResourceSample) -> Section {
    let mut section = Section::titled("Current System Stats");
    for resource in Resource::all() {
        section = section.item(format!(
            "{}: {:.1}%",
            resource.label(),
            sample.value(*resource)
        ));
    }
    section
}
