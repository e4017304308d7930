// File: alerter/src/alive_reminder.rs
use crate::alerts::Alert;
use crate::channels::ChannelSet;
use crate::config::AliveReminderConfig;
use crate::store::{keys, Store};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

/// Periodically tells every channel that the alerter is still running
pub struct AliveReminder {
    alerter_name: String,
    channels: Arc<ChannelSet>,
    store: Option<Arc<Store>>,
    interval: Duration,
    scheduler: JobScheduler,
}

impl AliveReminder {
    pub async fn new(
        alerter_name: String,
        config: &AliveReminderConfig,
        channels: Arc<ChannelSet>,
        store: Option<Arc<Store>>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            alerter_name,
            channels,
            store,
            interval: Duration::from_secs(config.interval_seconds),
            scheduler,
        })
    }

    pub async fn start(&self) -> Result<()> {
        let alerter_name = self.alerter_name.clone();
        let channels = self.channels.clone();
        let store = self.store.clone();

        let job = Job::new_repeated_async(self.interval, move |_uuid, _scheduler| {
            let alerter_name = alerter_name.clone();
            let channels = channels.clone();
            let store = store.clone();

            Box::pin(async move {
                remind(&alerter_name, &channels, store.as_deref()).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create alive reminder job: {}", e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add alive reminder job: {}", e))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start alive reminder: {}", e))?;

        info!("Alive reminder started, every {}s", self.interval.as_secs());
        Ok(())
    }
}

// Stored in place of an end time when muted until unmuted
const MUTED_INDEFINITELY: &str = "indefinitely";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuteStatus {
    pub muted: bool,
    /// `None` while muted means muted until unmuted
    pub until: Option<DateTime<Utc>>,
}

/// Mutes the reminder for `duration_seconds`, or until [`unmute`] is called
pub async fn mute(
    store: &Store,
    duration_seconds: Option<u64>,
    now: DateTime<Utc>,
) -> Result<MuteStatus, sqlx::Error> {
    match duration_seconds {
        Some(seconds) => {
            let until = i64::try_from(seconds)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            store
                .set_for(keys::ALIVE_REMINDER_MUTE, &until.to_rfc3339(), Duration::from_secs(seconds))
                .await?;
            info!("Alive reminder muted until {}", until);
            Ok(MuteStatus {
                muted: true,
                until: Some(until),
            })
        }
        None => {
            store.set(keys::ALIVE_REMINDER_MUTE, MUTED_INDEFINITELY).await?;
            info!("Alive reminder muted until unmuted");
            Ok(MuteStatus {
                muted: true,
                until: None,
            })
        }
    }
}

pub async fn unmute(store: &Store) -> Result<MuteStatus, sqlx::Error> {
    store.remove(keys::ALIVE_REMINDER_MUTE).await?;
    info!("Alive reminder unmuted");
    Ok(MuteStatus {
        muted: false,
        until: None,
    })
}

pub async fn mute_status(store: &Store) -> Result<MuteStatus, sqlx::Error> {
    let status = match store.get(keys::ALIVE_REMINDER_MUTE).await? {
        None => MuteStatus {
            muted: false,
            until: None,
        },
        Some(raw) => MuteStatus {
            muted: true,
            until: DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|at| at.with_timezone(&Utc)),
        },
    };
    Ok(status)
}

/// Sends one reminder unless it has been muted through the store
pub async fn remind(alerter_name: &str, channels: &ChannelSet, store: Option<&Store>) {
    if let Some(store) = store {
        match store.exists(keys::ALIVE_REMINDER_MUTE).await {
            Ok(true) => {
                debug!("Alive reminder is muted");
                return;
            }
            Ok(false) => {}
            Err(e) => error!("Could not check alive reminder mute: {}", e),
        }
    }

    channels.alert_info(Alert::alerter_alive(alerter_name));
}
