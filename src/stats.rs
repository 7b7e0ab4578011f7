//! Host resource sampling
//!
//! Provides:
//! - Resource identifiers and immutable per-poll samples
//! - A `Sampler` seam so the monitor core can run against canned sequences
//! - The sysinfo-backed implementation used in production

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use sysinfo::{CpuExt, DiskExt, PidExt, ProcessExt, System, SystemExt};

/// A monitored host resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resource {
    Cpu,
    Memory,
    Swap,
    Disk,
}

impl Resource {
    /// All monitored resources, in display order
    pub fn all() -> &'static [Resource] {
        &[Resource::Cpu, Resource::Memory, Resource::Swap, Resource::Disk]
    }

    /// Human-readable label used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "Memory",
            Resource::Swap => "Swap",
            Resource::Disk => "Disk",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resource::Cpu => "cpu",
            Resource::Memory => "memory",
            Resource::Swap => "swap",
            Resource::Disk => "disk",
        };
        write!(f, "{}", s)
    }
}

/// Utilization of every monitored resource at one instant.
///
/// Immutable once captured; consumed by the breach tracker.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub swap_percent: f64,
    pub disk_percent: f64,
    pub timestamp: DateTime<Local>,
}

impl ResourceSample {
    /// Read the utilization of a single resource
    pub fn value(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Cpu => self.cpu_percent,
            Resource::Memory => self.memory_percent,
            Resource::Swap => self.swap_percent,
            Resource::Disk => self.disk_percent,
        }
    }

    /// One-line summary for the cycle log
    pub fn summary(&self) -> String {
        format!(
            "cpu={:.1}% memory={:.1}% swap={:.1}% disk={:.1}%",
            self.cpu_percent, self.memory_percent, self.swap_percent, self.disk_percent
        )
    }
}

/// A process entry for the top-memory section of alert messages
#[derive(Debug, Clone)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub memory_percent: f64,
    pub cpu_percent: f64,
}

/// Source of resource samples
pub trait Sampler {
    /// Capture current utilization of every monitored resource
    fn sample(&mut self) -> Result<ResourceSample>;

    /// Top memory-consuming processes, heaviest first.
    ///
    /// Sources that cannot enumerate processes return an empty list and the
    /// corresponding notification section is omitted.
    fn top_memory_processes(&mut self, _limit: usize) -> Vec<ProcessSnapshot> {
        Vec::new()
    }
}

/// Sampler backed by the sysinfo crate
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SystemSampler {
    fn sample(&mut self) -> Result<ResourceSample> {
        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.system.refresh_disks_list();
        self.system.refresh_disks();

        let cpu_percent = self.system.global_cpu_info().cpu_usage() as f64;

        let total_memory = self.system.total_memory() as f64;
        if total_memory <= 0.0 {
            return Err(Error::Sampling("total memory reported as zero".into()));
        }
        let memory_percent = self.system.used_memory() as f64 / total_memory * 100.0;

        let total_swap = self.system.total_swap() as f64;
        let swap_percent = if total_swap > 0.0 {
            self.system.used_swap() as f64 / total_swap * 100.0
        } else {
            0.0
        };

        // Root filesystem, falling back to the first disk on hosts where
        // "/" is not a mount point of its own.
        let disk_percent = self
            .system
            .disks()
            .iter()
            .find(|disk| disk.mount_point() == std::path::Path::new("/"))
            .or_else(|| self.system.disks().first())
            .map(|disk| {
                let total = disk.total_space() as f64;
                if total > 0.0 {
                    (total - disk.available_space() as f64) / total * 100.0
                } else {
                    0.0
                }
            })
            .ok_or_else(|| Error::Sampling("no disks reported by the system".into()))?;

        Ok(ResourceSample {
            cpu_percent,
            memory_percent,
            swap_percent,
            disk_percent,
            timestamp: Local::now(),
        })
    }

    fn top_memory_processes(&mut self, limit: usize) -> Vec<ProcessSnapshot> {
        self.system.refresh_processes();

        let total_memory = self.system.total_memory() as f64;
        if total_memory <= 0.0 {
            return Vec::new();
        }

        let mut processes: Vec<ProcessSnapshot> = self
            .system
            .processes()
            .values()
            .map(|process| ProcessSnapshot {
                pid: process.pid().as_u32(),
                name: process.name().to_string(),
                memory_percent: process.memory() as f64 / total_memory * 100.0,
                cpu_percent: process.cpu_usage() as f64,
            })
            .collect();

        processes.sort_by(|a, b| {
            b.memory_percent
                .partial_cmp(&a.memory_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        processes.truncate(limit);
        processes
    }
}

#[cfg(test)]
pub(crate) struct MockSampler {
    sequence: Vec<ResourceSample>,
}

#[cfg(test)]
impl MockSampler {
    pub(crate) fn new(sequence: Vec<ResourceSample>) -> Self {
        Self { sequence }
    }

    /// Sample with a specific CPU reading and everything else idle
    pub(crate) fn cpu_at(percent: f64) -> ResourceSample {
        ResourceSample {
            cpu_percent: percent,
            memory_percent: 10.0,
            swap_percent: 0.0,
            disk_percent: 20.0,
            timestamp: Local::now(),
        }
    }
}

#[cfg(test)]
impl Sampler for MockSampler {
    fn sample(&mut self) -> Result<ResourceSample> {
        if self.sequence.is_empty() {
            return Err(Error::Sampling("mock sample sequence exhausted".into()));
        }
        Ok(self.sequence.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::Cpu.to_string(), "cpu");
        assert_eq!(Resource::Memory.to_string(), "memory");
        assert_eq!(Resource::Swap.label(), "Swap");
    }

    #[test]
    fn test_sample_value_lookup() {
        let sample = ResourceSample {
            cpu_percent: 10.0,
            memory_percent: 20.0,
            swap_percent: 30.0,
            disk_percent: 40.0,
            timestamp: Local::now(),
        };
        assert_eq!(sample.value(Resource::Cpu), 10.0);
        assert_eq!(sample.value(Resource::Memory), 20.0);
        assert_eq!(sample.value(Resource::Swap), 30.0);
        assert_eq!(sample.value(Resource::Disk), 40.0);
    }

    #[test]
    fn test_mock_sampler_returns_sequence_then_errors() {
        let mut sampler = MockSampler::new(vec![MockSampler::cpu_at(91.0)]);
        let sample = sampler.sample().unwrap();
        assert!(sample.cpu_percent > 90.0);
        assert!(sampler.sample().is_err());
    }

    #[test]
    fn test_system_sampler_reports_plausible_values() {
        let mut sampler = SystemSampler::new();
        // Minimal container environments may expose no disks; when sampling
        // succeeds every percentage must be in range.
        if let Ok(sample) = sampler.sample() {
            for resource in Resource::all() {
                let value = sample.value(*resource);
                assert!((0.0..=100.0).contains(&value), "{resource}: {value}");
            }
        }
    }
}
