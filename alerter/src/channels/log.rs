use super::Channel;
use crate::alerts::{Alert, Severity};
use anyhow::Result;
use tracing::{error, info, warn};

/// Writes alerts to the application log
pub struct LogChannel {
    name: String,
}

impl LogChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Channel for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, severity: Severity, alert: &Alert) -> Result<()> {
        match severity {
            Severity::Info => info!(target: "alerter::alerts", "{} {}: {}", severity, alert.code, alert.message),
            Severity::Warning => warn!(target: "alerter::alerts", "{} {}: {}", severity, alert.code, alert.message),
            Severity::Critical | Severity::Error => {
                error!(target: "alerter::alerts", "{} {}: {}", severity, alert.code, alert.message)
            }
        }
        Ok(())
    }
}
