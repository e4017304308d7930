// File: alerter/src/channels/webhook.rs
use super::Channel;
use crate::alerts::{Alert, AlertCode, Severity};
use crate::constants::webhook::{QUEUE_CAPACITY, REQUEST_TIMEOUT};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub code: AlertCode,
    pub origin: String,
    pub message: String,
    pub alerter: String,
}

/// Posts alerts as JSON to a webhook URL
///
/// Alerts are queued and delivered by a background task, so `send` never
/// waits on the network. Alerts arriving while the queue is full are dropped.
pub struct WebhookChannel {
    name: String,
    alerter_name: String,
    webhook_url: String,
    sender: Option<mpsc::Sender<WebhookPayload>>,
}

impl WebhookChannel {
    /// Must be called from within a tokio runtime when `webhook_url` is set
    pub fn spawn(name: impl Into<String>, webhook_url: String, alerter_name: String) -> Result<Self> {
        Self::spawn_with_capacity(name, webhook_url, alerter_name, QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(
        name: impl Into<String>,
        webhook_url: String,
        alerter_name: String,
        capacity: usize,
    ) -> Result<Self> {
        let name = name.into();

        if webhook_url.is_empty() {
            debug!("No webhook URL configured, channel {} is disabled", name);
            return Ok(Self {
                name,
                alerter_name,
                webhook_url,
                sender: None,
            });
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for webhook channel: {}", e))?;

        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(deliver_queued(client, webhook_url.clone(), receiver));

        info!("Webhook channel {} delivering to {}", name, webhook_url);
        Ok(Self {
            name,
            alerter_name,
            webhook_url,
            sender: Some(sender),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    fn send(&self, severity: Severity, alert: &Alert) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };

        let payload = WebhookPayload {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            code: alert.code,
            origin: alert.origin.clone(),
            message: alert.message.clone(),
            alerter: self.alerter_name.clone(),
        };

        match sender.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(payload)) => {
                warn!(
                    "Webhook queue for {} is full, dropping {} alert {} for {}",
                    self.name, payload.severity, payload.code, payload.origin
                );
                Err(anyhow!("Webhook queue for {} is full", self.name))
            }
            Err(TrySendError::Closed(_)) => Err(anyhow!("Webhook queue for {} is closed", self.name)),
        }
    }
}

async fn deliver_queued(
    client: Client,
    webhook_url: String,
    mut receiver: mpsc::Receiver<WebhookPayload>,
) {
    while let Some(payload) = receiver.recv().await {
        deliver(&client, &webhook_url, &payload).await;
    }
    debug!("Webhook queue for {} closed", webhook_url);
}

async fn deliver(client: &Client, webhook_url: &str, payload: &WebhookPayload) {
    match timeout(REQUEST_TIMEOUT, client.post(webhook_url).json(payload).send()).await {
        Ok(Ok(response)) => {
            if response.status().is_success() {
                debug!("Alert {} delivered for {}", payload.code, payload.origin);
            } else {
                warn!(
                    "Alert webhook returned status: {} for {}",
                    response.status(),
                    payload.origin
                );
            }
        }
        Ok(Err(e)) => {
            warn!("Failed to send alert for {}: {}", payload.origin, e);
        }
        Err(_) => {
            warn!("Alert webhook timeout for {}", payload.origin);
        }
    }
}
