//! Alert channel that records everything it is given

use alerter::alerts::{Alert, AlertCode, Severity};
use alerter::channels::{AlertFilter, Channel, ChannelSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct CounterChannel {
    sent: Mutex<Vec<(Severity, Alert)>>,
}

impl CounterChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A channel set delivering everything to `counter`
    pub fn channel_set(counter: &Arc<CounterChannel>) -> ChannelSet {
        ChannelSet::new(vec![counter.clone()], AlertFilter::allow_all())
    }

    pub fn events(&self) -> Vec<(Severity, AlertCode)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(severity, alert)| (*severity, alert.code))
            .collect()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }

    pub fn count_code(&self, code: AlertCode) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, a)| a.code == code)
            .count()
    }

    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Channel for CounterChannel {
    fn name(&self) -> &str {
        "counter"
    }

    fn send(&self, severity: Severity, alert: &Alert) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((severity, alert.clone()));
        Ok(())
    }
}
