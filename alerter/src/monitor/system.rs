// File: alerter/src/monitor/system.rs
use crate::alerts::system::BandedMetric;
use crate::constants::system_metrics as m;
use crate::errors::{MetricsError, MonitorError};
use crate::metrics::{MetricsScraper, MetricsSnapshot};
use crate::monitor::MonitorContext;
use crate::scaling::round_to;
use crate::state::SystemState;
use crate::store::keys;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Scrapes the metrics exporter of the host running a node
pub struct SystemMonitor {
    name: String,
    system: Arc<RwLock<SystemState>>,
    scraper: MetricsScraper,
    endpoint: String,
    ctx: MonitorContext,
}

impl SystemMonitor {
    pub fn new(system: Arc<RwLock<SystemState>>, scraper: MetricsScraper, endpoint: String, ctx: MonitorContext) -> Self {
        let name = format!("System monitor ({})", endpoint);
        Self {
            name,
            system,
            scraper,
            endpoint,
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn system(&self) -> &Arc<RwLock<SystemState>> {
        &self.system
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub async fn status(&self) -> String {
        self.system.read().await.status()
    }

    pub async fn save_state(&self) -> Result<(), MonitorError> {
        let Some(store) = self.ctx.store.as_ref() else {
            return Ok(());
        };

        debug!("Saving {} state", self.name);
        let update = self.system.read().await.persisted_fields();
        store.apply(&update).await?;
        store
            .set_for(
                &keys::system_monitor_alive(&self.name),
                &self.ctx.clock.now().timestamp().to_string(),
                Duration::from_secs(self.ctx.store_config.system_monitor_alive_key_timeout),
            )
            .await?;
        Ok(())
    }

    /// One scrape; every derived value is computed on its own so a missing
    /// metric only skips the values that need it
    pub async fn monitor(&mut self) -> Result<(), MonitorError> {
        let snapshot = self.scraper.get_metrics(&self.endpoint, &m::ALL).await?;
        let channels = &self.ctx.channels;
        let mut system = self.system.write().await;
        let system_name = system.name().to_string();

        match snapshot.single(m::PROCESS_CPU_SECONDS_TOTAL) {
            Ok(v) => {
                debug!("{} process_cpu_seconds_total: {}", system_name, v);
                system.set_process_cpu_seconds_total(v, channels);
            }
            Err(e) => debug!("{} skipping process_cpu_seconds_total: {}", system_name, e),
        }

        match snapshot.single(m::PROCESS_VIRTUAL_MEMORY_BYTES) {
            Ok(v) => {
                debug!("{} virtual_memory_usage: {}", system_name, v);
                system.set_virtual_memory_usage(v, channels);
            }
            Err(e) => debug!("{} skipping virtual_memory_usage: {}", system_name, e),
        }

        for metric in BandedMetric::ALL {
            match banded_value(&snapshot, metric) {
                Ok(v) => {
                    debug!("{} {}: {}", system_name, metric.label(), v);
                    system.set_banded(metric, v, channels);
                }
                Err(e) => debug!("{} skipping {}: {}", system_name, metric.label(), e),
            }
        }

        info!("{} status: {}", self.name, system.status());
        Ok(())
    }
}

/// Percentage for a banded metric, rounded to two decimals
pub fn banded_value(snapshot: &MetricsSnapshot, metric: BandedMetric) -> Result<f64, MetricsError> {
    let value = match metric {
        BandedMetric::ProcessMemoryUsage => {
            ratio(
                snapshot.single(m::GO_MEMSTATS_ALLOC_BYTES)?,
                snapshot.single(m::GO_MEMSTATS_ALLOC_BYTES_TOTAL)?,
                m::GO_MEMSTATS_ALLOC_BYTES_TOTAL,
            )? * 100.0
        }
        BandedMetric::OpenFileDescriptors => {
            ratio(
                snapshot.single(m::PROCESS_OPEN_FDS)?,
                snapshot.single(m::PROCESS_MAX_FDS)?,
                m::PROCESS_MAX_FDS,
            )? * 100.0
        }
        BandedMetric::SystemCpuUsage => {
            let samples = snapshot.labeled(m::NODE_CPU_SECONDS_TOTAL)?;
            let total: f64 = samples.iter().map(|(_, v)| v).sum();
            let idle: f64 = samples
                .iter()
                .filter(|(labels, _)| labels.get("mode").map(String::as_str) == Some("idle"))
                .map(|(_, v)| v)
                .sum();
            100.0 - ratio(idle, total, m::NODE_CPU_SECONDS_TOTAL)? * 100.0
        }
        BandedMetric::SystemRamUsage => {
            let total = snapshot.single(m::NODE_MEMORY_MEMTOTAL_BYTES)?;
            let available = snapshot.single(m::NODE_MEMORY_MEMAVAILABLE_BYTES)?;
            ratio(total - available, total, m::NODE_MEMORY_MEMTOTAL_BYTES)? * 100.0
        }
        BandedMetric::SystemStorageUsage => {
            let available = snapshot.single(m::NODE_FILESYSTEM_AVAIL_BYTES)?;
            let size = snapshot.single(m::NODE_FILESYSTEM_SIZE_BYTES)?;
            100.0 - ratio(available, size, m::NODE_FILESYSTEM_SIZE_BYTES)? * 100.0
        }
    };
    Ok(round_to(value, 2))
}

fn ratio(numerator: f64, denominator: f64, metric: &str) -> Result<f64, MetricsError> {
    if denominator == 0.0 {
        return Err(MetricsError::Malformed {
            metric: metric.to_string(),
            reason: "is zero".to_string(),
        });
    }
    Ok(numerator / denominator)
}
