// File: alerter/src/alerts/system.rs
use super::{Alert, AlertCode};

/// Host metrics classified against safe/danger boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandedMetric {
    ProcessMemoryUsage,
    OpenFileDescriptors,
    SystemCpuUsage,
    SystemRamUsage,
    SystemStorageUsage,
}

impl BandedMetric {
    pub const ALL: [BandedMetric; 5] = [
        BandedMetric::ProcessMemoryUsage,
        BandedMetric::OpenFileDescriptors,
        BandedMetric::SystemCpuUsage,
        BandedMetric::SystemRamUsage,
        BandedMetric::SystemStorageUsage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BandedMetric::ProcessMemoryUsage => "process memory usage",
            BandedMetric::OpenFileDescriptors => "open file descriptors",
            BandedMetric::SystemCpuUsage => "system CPU usage",
            BandedMetric::SystemRamUsage => "system RAM usage",
            BandedMetric::SystemStorageUsage => "system storage usage",
        }
    }

    fn codes(&self) -> [AlertCode; 4] {
        use AlertCode::*;
        match self {
            BandedMetric::ProcessMemoryUsage => [
                MemoryUsageIncreased,
                MemoryUsageDecreased,
                MemoryUsageIncreasedInsideWarningRange,
                MemoryUsageIncreasedInsideDangerRange,
            ],
            BandedMetric::OpenFileDescriptors => [
                OpenFileDescriptorsIncreased,
                OpenFileDescriptorsDecreased,
                OpenFileDescriptorsIncreasedInsideWarningRange,
                OpenFileDescriptorsIncreasedInsideDangerRange,
            ],
            BandedMetric::SystemCpuUsage => [
                SystemCpuUsageIncreased,
                SystemCpuUsageDecreased,
                SystemCpuUsageIncreasedInsideWarningRange,
                SystemCpuUsageIncreasedInsideDangerRange,
            ],
            BandedMetric::SystemRamUsage => [
                SystemRamUsageIncreased,
                SystemRamUsageDecreased,
                SystemRamUsageIncreasedInsideWarningRange,
                SystemRamUsageIncreasedInsideDangerRange,
            ],
            BandedMetric::SystemStorageUsage => [
                SystemStorageUsageIncreased,
                SystemStorageUsageDecreased,
                SystemStorageUsageIncreasedInsideWarningRange,
                SystemStorageUsageIncreasedInsideDangerRange,
            ],
        }
    }
}

impl Alert {
    pub fn metric_increased(metric: BandedMetric, system: &str, old: f64, new: f64) -> Self {
        Alert::new(
            metric.codes()[0],
            system,
            format!("{} {} increased from {}% to {}%.", system, metric.label(), old, new),
        )
    }

    pub fn metric_decreased(metric: BandedMetric, system: &str, old: f64, new: f64) -> Self {
        Alert::new(
            metric.codes()[1],
            system,
            format!("{} {} decreased from {}% to {}%.", system, metric.label(), old, new),
        )
    }

    pub fn metric_inside_warning_range(metric: BandedMetric, system: &str, new: f64, safe: f64) -> Self {
        Alert::new(
            metric.codes()[2],
            system,
            format!(
                "{} {} increased to {}%, above the safe boundary of {}%.",
                system,
                metric.label(),
                new,
                safe
            ),
        )
    }

    pub fn metric_inside_danger_range(metric: BandedMetric, system: &str, new: f64, danger: f64) -> Self {
        Alert::new(
            metric.codes()[3],
            system,
            format!(
                "{} {} increased to {}%, above the danger boundary of {}%.",
                system,
                metric.label(),
                new,
                danger
            ),
        )
    }

    pub fn new_process_cpu_seconds_total(system: &str, new: f64) -> Self {
        Alert::new(
            AlertCode::NewProcessCpuSecondsTotal,
            system,
            format!("{} process CPU seconds total changed to {}.", system, new),
        )
    }

    pub fn new_virtual_memory_usage(system: &str, new: f64) -> Self {
        Alert::new(
            AlertCode::NewVirtualMemoryUsage,
            system,
            format!("{} virtual memory usage changed to {} bytes.", system, new),
        )
    }
}
