//! Alert fan-out to notification channels

pub mod log;
pub mod webhook;

pub use self::log::LogChannel;
pub use webhook::WebhookChannel;

use crate::alerts::{Alert, AlertCode, Severity};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// A destination for alerts
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, severity: Severity, alert: &Alert) -> Result<()>;

    /// Whether the channel is configured to deliver anything at all
    fn is_enabled(&self) -> bool {
        true
    }

    fn send_info(&self, alert: &Alert) -> Result<()> {
        self.send(Severity::Info, alert)
    }

    fn send_warning(&self, alert: &Alert) -> Result<()> {
        self.send(Severity::Warning, alert)
    }

    fn send_critical(&self, alert: &Alert) -> Result<()> {
        self.send(Severity::Critical, alert)
    }

    fn send_error(&self, alert: &Alert) -> Result<()> {
        self.send(Severity::Error, alert)
    }
}

/// Global enable/disable matrix applied before any channel sees an alert
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    disabled_alerts: HashSet<AlertCode>,
    disabled_severities: HashSet<Severity>,
}

impl AlertFilter {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn new(
        disabled_alerts: impl IntoIterator<Item = AlertCode>,
        disabled_severities: impl IntoIterator<Item = Severity>,
    ) -> Self {
        Self {
            disabled_alerts: disabled_alerts.into_iter().collect(),
            disabled_severities: disabled_severities.into_iter().collect(),
        }
    }

    pub fn allows(&self, severity: Severity, code: AlertCode) -> bool {
        !self.disabled_alerts.contains(&code) && !self.disabled_severities.contains(&severity)
    }
}

pub struct ChannelSet {
    channels: Vec<Arc<dyn Channel>>,
    filter: AlertFilter,
}

impl ChannelSet {
    pub fn new(channels: Vec<Arc<dyn Channel>>, filter: AlertFilter) -> Self {
        Self { channels, filter }
    }

    pub fn alert_info(&self, alert: Alert) {
        self.dispatch(Severity::Info, alert)
    }

    pub fn alert_warning(&self, alert: Alert) {
        self.dispatch(Severity::Warning, alert)
    }

    pub fn alert_critical(&self, alert: Alert) {
        self.dispatch(Severity::Critical, alert)
    }

    pub fn alert_error(&self, alert: Alert) {
        self.dispatch(Severity::Error, alert)
    }

    /// Emits at a severity decided by the caller
    pub fn alert(&self, severity: Severity, alert: Alert) {
        self.dispatch(severity, alert)
    }

    pub fn enabled_channels_list(&self) -> Vec<String> {
        self.channels
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.name().to_string())
            .collect()
    }

    fn dispatch(&self, severity: Severity, alert: Alert) {
        if !self.filter.allows(severity, alert.code) {
            debug!("Alert {} at {} is disabled, not sending", alert.code, severity);
            return;
        }

        for channel in &self.channels {
            let result = match severity {
                Severity::Info => channel.send_info(&alert),
                Severity::Warning => channel.send_warning(&alert),
                Severity::Critical => channel.send_critical(&alert),
                Severity::Error => channel.send_error(&alert),
            };
            if let Err(e) = result {
                error!(
                    "Channel {} failed to deliver {} alert {}: {}",
                    channel.name(),
                    severity,
                    alert.code,
                    e
                );
            }
        }
    }
}
