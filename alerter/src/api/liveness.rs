use crate::alerts::Alert;
use crate::channels::ChannelSet;
use crate::constants::api::DOWN_CRITICAL_AFTER_SECONDS;
use crate::timing::TimedTaskLimiter;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Tracks whether a monitor can reach its API server
#[derive(Debug, Clone)]
pub struct ApiLiveness {
    api_down: bool,
    api_down_limiter: TimedTaskLimiter,
    critical_alert_sent: bool,
}

impl Default for ApiLiveness {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiLiveness {
    pub fn new() -> Self {
        Self {
            api_down: false,
            api_down_limiter: TimedTaskLimiter::new(Duration::seconds(DOWN_CRITICAL_AFTER_SECONDS)),
            critical_alert_sent: false,
        }
    }

    pub fn is_api_down(&self) -> bool {
        self.api_down
    }

    /// Warns on the first failure; a validator monitor escalates once to
    /// critical if the API stays unreachable past the grace period
    pub fn set_api_as_down(
        &mut self,
        monitor: &str,
        is_validator_monitor: bool,
        channels: &ChannelSet,
        now: DateTime<Utc>,
    ) {
        debug!("{} set_api_as_down: api_down(currently)={}", monitor, self.api_down);

        if !self.api_down {
            channels.alert_warning(Alert::api_is_down(monitor));
            self.api_down_limiter.did_task(now);
        }

        if is_validator_monitor && self.api_down_limiter.can_do_task(now) && !self.critical_alert_sent {
            channels.alert_critical(Alert::api_is_down(monitor));
            self.critical_alert_sent = true;
        }

        self.api_down = true;
    }

    pub fn set_api_as_up(&mut self, monitor: &str, channels: &ChannelSet) {
        debug!("{} set_api_as_up: api_down(currently)={}", monitor, self.api_down);

        if self.api_down {
            channels.alert_info(Alert::api_is_up_again(monitor));
        }

        self.critical_alert_sent = false;
        self.api_down = false;
    }
}
