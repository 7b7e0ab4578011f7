//! Consecutive-breach detection over a fixed polling window
//!
//! A resource alerts only when every sample in the window exceeds its
//! threshold. A single clean sample zeroes the counter, and the counter can
//! never reach the window length again within the same window, so an
//! interrupted breach stays excluded even if the resource re-breaches later.

use crate::config::Thresholds;
use crate::stats::{Resource, ResourceSample};
use std::collections::BTreeMap;

/// Per-resource alert thresholds in percent
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    entries: BTreeMap<Resource, f64>,
}

impl ThresholdTable {
    /// Empty table: nothing is monitored, nothing can alert
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a threshold for a resource
    pub fn with(mut self, resource: Resource, threshold: f64) -> Self {
        self.entries.insert(resource, threshold);
        self
    }

    /// Build the table from the configured thresholds
    pub fn from_config(thresholds: &Thresholds) -> Self {
        Self::new()
            .with(Resource::Cpu, thresholds.cpu)
            .with(Resource::Memory, thresholds.memory)
            .with(Resource::Swap, thresholds.swap)
            .with(Resource::Disk, thresholds.disk)
    }

    pub fn get(&self, resource: Resource) -> Option<f64> {
        self.entries.get(&resource).copied()
    }

    /// Monitored resources with their thresholds, in fixed order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        self.entries.iter().map(|(r, t)| (*r, *t))
    }
}

/// A resource whose breach was sustained across a full window
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub resource: Resource,
    /// Utilization observed when the window closed
    pub value: f64,
    pub threshold: f64,
}

impl AlertRecord {
    /// Notification line for this record
    pub fn describe(&self) -> String {
        format!(
            "{}: {:.1}% (threshold: {}%)",
            self.resource.label(),
            self.value,
            self.threshold
        )
    }
}

/// Consecutive-breach counters for one polling window.
///
/// Counters start at zero, are incremented on every breaching sample, reset
/// on every clean one, and are discarded with the tracker when the cycle
/// ends.
#[derive(Debug)]
pub struct BreachTracker {
    thresholds: ThresholdTable,
    counters: BTreeMap<Resource, u32>,
}

impl BreachTracker {
    pub fn new(thresholds: &ThresholdTable) -> Self {
        let counters = thresholds.iter().map(|(r, _)| (r, 0)).collect();
        Self {
            thresholds: thresholds.clone(),
            counters,
        }
    }

    /// Feed one sample into the window; returns the resources that breached
    /// their threshold in this sample.
    pub fn observe(&mut self, sample: &ResourceSample) -> Vec<Resource> {
        let mut breached = Vec::new();
        for (resource, threshold) in self.thresholds.iter() {
            let counter = self.counters.entry(resource).or_insert(0);
            if sample.value(resource) > threshold {
                *counter += 1;
                breached.push(resource);
            } else {
                *counter = 0;
            }
        }
        breached
    }

    /// Close the window and emit an alert for every resource whose breach
    /// was sustained across all `window` samples. Alert values are read
    /// from `reference`, the sample captured when the window closed.
    pub fn finish(&self, window: u32, reference: &ResourceSample) -> Vec<AlertRecord> {
        self.counters
            .iter()
            .filter(|(_, counter)| **counter == window)
            .map(|(resource, _)| AlertRecord {
                resource: *resource,
                value: reference.value(*resource),
                threshold: self.thresholds.get(*resource).unwrap_or_default(),
            })
            .collect()
    }

    /// Evaluate a complete window of samples in one call.
    ///
    /// The last sample of the window doubles as the reference for alert
    /// values. An empty window yields an empty alert set.
    #[allow(dead_code)] // Public API for one-shot window evaluation
    pub fn evaluate(
        samples: &[ResourceSample],
        thresholds: &ThresholdTable,
        window: u32,
    ) -> Vec<AlertRecord> {
        let mut tracker = BreachTracker::new(thresholds);
        for sample in samples {
            tracker.observe(sample);
        }
        match samples.last() {
            Some(reference) => tracker.finish(window, reference),
            None => Vec::new(),
        }
    }
}
