// File: alerter/src/state/system.rs
use crate::alerts::system::BandedMetric;
use crate::alerts::Alert;
use crate::channels::ChannelSet;
use crate::config::{Band, MetricBands};
use crate::store::{keys, HashUpdate, Store};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub name: String,
    pub chain: String,
    pub is_validator: bool,
    pub process_cpu_seconds_total: Option<f64>,
    pub process_memory_usage: Option<f64>,
    pub virtual_memory_usage: Option<f64>,
    pub open_file_descriptors: Option<f64>,
    pub system_cpu_usage: Option<f64>,
    pub system_ram_usage: Option<f64>,
    pub system_storage_usage: Option<f64>,
}

/// Host metrics of the machine running a node
#[derive(Debug, Clone)]
pub struct SystemState {
    name: String,
    chain: String,
    is_validator: bool,
    bands: MetricBands,

    process_cpu_seconds_total: Option<f64>,
    virtual_memory_usage: Option<f64>,
    process_memory_usage: Option<f64>,
    open_file_descriptors: Option<f64>,
    system_cpu_usage: Option<f64>,
    system_ram_usage: Option<f64>,
    system_storage_usage: Option<f64>,
}

impl SystemState {
    /// `bands` are the boundaries for the class of the node (validator or not)
    pub fn new(name: impl Into<String>, chain: impl Into<String>, is_validator: bool, bands: MetricBands) -> Self {
        Self {
            name: name.into(),
            chain: chain.into(),
            is_validator,
            bands,
            process_cpu_seconds_total: None,
            virtual_memory_usage: None,
            process_memory_usage: None,
            open_file_descriptors: None,
            system_cpu_usage: None,
            system_ram_usage: None,
            system_storage_usage: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_validator(&self) -> bool {
        self.is_validator
    }

    pub fn process_cpu_seconds_total(&self) -> Option<f64> {
        self.process_cpu_seconds_total
    }

    pub fn virtual_memory_usage(&self) -> Option<f64> {
        self.virtual_memory_usage
    }

    pub fn banded_value(&self, metric: BandedMetric) -> Option<f64> {
        match metric {
            BandedMetric::ProcessMemoryUsage => self.process_memory_usage,
            BandedMetric::OpenFileDescriptors => self.open_file_descriptors,
            BandedMetric::SystemCpuUsage => self.system_cpu_usage,
            BandedMetric::SystemRamUsage => self.system_ram_usage,
            BandedMetric::SystemStorageUsage => self.system_storage_usage,
        }
    }

    fn banded_slot(&mut self, metric: BandedMetric) -> &mut Option<f64> {
        match metric {
            BandedMetric::ProcessMemoryUsage => &mut self.process_memory_usage,
            BandedMetric::OpenFileDescriptors => &mut self.open_file_descriptors,
            BandedMetric::SystemCpuUsage => &mut self.system_cpu_usage,
            BandedMetric::SystemRamUsage => &mut self.system_ram_usage,
            BandedMetric::SystemStorageUsage => &mut self.system_storage_usage,
        }
    }

    fn band(&self, metric: BandedMetric) -> Band {
        match metric {
            BandedMetric::ProcessMemoryUsage => self.bands.process_memory_usage,
            BandedMetric::OpenFileDescriptors => self.bands.open_file_descriptors,
            BandedMetric::SystemCpuUsage => self.bands.system_cpu_usage,
            BandedMetric::SystemRamUsage => self.bands.system_ram_usage,
            BandedMetric::SystemStorageUsage => self.bands.system_storage_usage,
        }
    }

    pub fn status(&self) -> String {
        format!(
            "process_cpu_seconds_total={}, process_memory_usage={}, virtual_memory_usage={}, \
             open_file_descriptors={}, system_cpu_usage={}, system_ram_usage={}, system_storage_usage={}",
            fmt_opt(self.process_cpu_seconds_total),
            fmt_opt(self.process_memory_usage),
            fmt_opt(self.virtual_memory_usage),
            fmt_opt(self.open_file_descriptors),
            fmt_opt(self.system_cpu_usage),
            fmt_opt(self.system_ram_usage),
            fmt_opt(self.system_storage_usage)
        )
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            name: self.name.clone(),
            chain: self.chain.clone(),
            is_validator: self.is_validator,
            process_cpu_seconds_total: self.process_cpu_seconds_total,
            process_memory_usage: self.process_memory_usage,
            virtual_memory_usage: self.virtual_memory_usage,
            open_file_descriptors: self.open_file_descriptors,
            system_cpu_usage: self.system_cpu_usage,
            system_ram_usage: self.system_ram_usage,
            system_storage_usage: self.system_storage_usage,
        }
    }

    pub fn set_process_cpu_seconds_total(&mut self, new_value: f64, channels: &ChannelSet) {
        debug!(
            "{} set_process_cpu_seconds_total: before={}, new={}",
            self.name,
            fmt_opt(self.process_cpu_seconds_total),
            new_value
        );

        if self.process_cpu_seconds_total.is_some_and(|old| old != new_value) {
            channels.alert_info(Alert::new_process_cpu_seconds_total(&self.name, new_value));
        }
        self.process_cpu_seconds_total = Some(new_value);
    }

    pub fn set_virtual_memory_usage(&mut self, new_value: f64, channels: &ChannelSet) {
        debug!(
            "{} set_virtual_memory_usage: before={}, new={}",
            self.name,
            fmt_opt(self.virtual_memory_usage),
            new_value
        );

        if self.virtual_memory_usage.is_some_and(|old| old != new_value) {
            channels.alert_info(Alert::new_virtual_memory_usage(&self.name, new_value));
        }
        self.virtual_memory_usage = Some(new_value);
    }

    /// Classifies a percentage against the metric's safe and danger boundaries
    pub fn set_banded(&mut self, metric: BandedMetric, new_value: f64, channels: &ChannelSet) {
        let old = self.banded_value(metric);
        debug!(
            "{} set_{}: before={}, new={}",
            self.name,
            store_field(metric),
            fmt_opt(old),
            new_value
        );

        if let Some(old) = old.filter(|o| *o != new_value) {
            let Band { safe, danger } = self.band(metric);
            let name = self.name.as_str();

            if new_value >= safe && new_value < danger {
                if new_value > old {
                    channels.alert_warning(Alert::metric_inside_warning_range(metric, name, new_value, safe));
                } else {
                    channels.alert_info(Alert::metric_decreased(metric, name, old, new_value));
                }
            } else if new_value >= danger {
                if new_value > old {
                    channels.alert_critical(Alert::metric_inside_danger_range(metric, name, new_value, danger));
                } else {
                    channels.alert_critical(Alert::metric_decreased(metric, name, old, new_value));
                }
            } else if new_value < old {
                channels.alert_info(Alert::metric_decreased(metric, name, old, new_value));
            } else {
                channels.alert_info(Alert::metric_increased(metric, name, old, new_value));
            }
        }

        *self.banded_slot(metric) = Some(new_value);
    }

    pub fn set_process_memory_usage(&mut self, new_value: f64, channels: &ChannelSet) {
        self.set_banded(BandedMetric::ProcessMemoryUsage, new_value, channels)
    }

    pub fn set_open_file_descriptors(&mut self, new_value: f64, channels: &ChannelSet) {
        self.set_banded(BandedMetric::OpenFileDescriptors, new_value, channels)
    }

    pub fn set_system_cpu_usage(&mut self, new_value: f64, channels: &ChannelSet) {
        self.set_banded(BandedMetric::SystemCpuUsage, new_value, channels)
    }

    pub fn set_system_ram_usage(&mut self, new_value: f64, channels: &ChannelSet) {
        self.set_banded(BandedMetric::SystemRamUsage, new_value, channels)
    }

    pub fn set_system_storage_usage(&mut self, new_value: f64, channels: &ChannelSet) {
        self.set_banded(BandedMetric::SystemStorageUsage, new_value, channels)
    }

    pub async fn load_state(&mut self, store: &Store) -> Result<(), sqlx::Error> {
        let bucket = keys::hash_blockchain(&self.chain);
        let name = self.name.clone();

        self.process_cpu_seconds_total = store
            .hget_parsed(&bucket, &keys::system_field("process_cpu_seconds_total", &name))
            .await?;
        self.virtual_memory_usage = store
            .hget_parsed(&bucket, &keys::system_field("virtual_memory_usage", &name))
            .await?;
        for metric in BandedMetric::ALL {
            let value = store
                .hget_parsed(&bucket, &keys::system_field(store_field(metric), &name))
                .await?;
            *self.banded_slot(metric) = value;
        }

        debug!("Restored {} state: {}", name, self.status());
        Ok(())
    }

    pub async fn save_state(&self, store: &Store) -> Result<(), sqlx::Error> {
        store.apply(&self.persisted_fields()).await
    }

    pub fn persisted_fields(&self) -> HashUpdate {
        debug!("Saving {} state: {}", self.name, self.status());

        let bucket = keys::hash_blockchain(&self.chain);
        let mut fields = vec![
            (
                keys::system_field("process_cpu_seconds_total", &self.name),
                self.process_cpu_seconds_total.map(|v| v.to_string()),
            ),
            (
                keys::system_field("virtual_memory_usage", &self.name),
                self.virtual_memory_usage.map(|v| v.to_string()),
            ),
        ];
        for metric in BandedMetric::ALL {
            fields.push((
                keys::system_field(store_field(metric), &self.name),
                self.banded_value(metric).map(|v| v.to_string()),
            ));
        }

        HashUpdate { bucket, fields }
    }
}

fn store_field(metric: BandedMetric) -> &'static str {
    match metric {
        BandedMetric::ProcessMemoryUsage => "process_memory_usage",
        BandedMetric::OpenFileDescriptors => "open_file_descriptors",
        BandedMetric::SystemCpuUsage => "system_cpu_usage",
        BandedMetric::SystemRamUsage => "system_ram_usage",
        BandedMetric::SystemStorageUsage => "system_storage_usage",
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}
