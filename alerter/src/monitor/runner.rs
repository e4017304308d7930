//! One supervised pass of each monitor and the handling of its failures

use crate::alerts::Alert;
use crate::errors::{ApiError, GitHubError, MonitorError, NoLiveSourceError};
use crate::monitor::{GitHubMonitor, NodeMonitor, SystemMonitor};
use crate::registry::NodeHandle;
use crate::supervisor::{PassOutcome, Worker};
use tracing::{error, info, warn};

/// Which half of a node pass an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Indirect,
}

impl NodeMonitor {
    /// Direct monitoring, then indirect monitoring if it succeeded and data
    /// sources are configured. State is saved whatever the outcome.
    pub async fn run_pass(&mut self) -> PassOutcome {
        let mut outcome = match self.monitor_direct().await {
            Ok(()) => PassOutcome::Continue,
            Err(e) => self.handle_error(e, Stage::Direct).await,
        };

        if outcome == PassOutcome::Continue && !self.indirect_monitoring_disabled() {
            if let Err(e) = self.monitor_indirect().await {
                outcome = self.handle_error(e, Stage::Indirect).await;
            }
        }

        if outcome == PassOutcome::Continue {
            info!("{} status: {}", self.node().name(), self.status().await);
        }

        if let Err(e) = self.save_all().await {
            error!("{} could not save state: {}", self.name(), e);
            if outcome == PassOutcome::Continue {
                outcome = PassOutcome::Restart(e.to_string());
            }
        }

        outcome
    }

    async fn save_all(&self) -> Result<(), MonitorError> {
        if let Some(store) = self.context().store.as_ref() {
            // The guard is released before the write
            let update = self.node().state.read().await.persisted_fields();
            store.apply(&update).await?;
        }
        self.save_state().await
    }

    /// Turns a failed pass into state transitions and alerts
    pub async fn handle_error(&mut self, error: MonitorError, stage: Stage) -> PassOutcome {
        let channels = self.context().channels.clone();
        let now = self.context().clock.now();

        // Connectivity errors of the indirect pass concern the data source
        let target: NodeHandle = match stage {
            Stage::Direct => self.node().clone(),
            Stage::Indirect => self
                .last_data_source_used()
                .cloned()
                .unwrap_or_else(|| self.node().clone()),
        };

        match error {
            e if e.is_fatal() => {
                error!("{} hit a fatal error: {}", self.name(), e);
                PassOutcome::Stop(e.to_string())
            }
            MonitorError::Api(ApiError::ConnectionLost(reason)) => {
                warn!("{} lost connection with {}: {}", self.name(), target.name(), reason);
                target.state.write().await.set_as_down(&channels, now);
                PassOutcome::Continue
            }
            MonitorError::Api(ApiError::NodeNotConnected(reason)) => {
                warn!("{} is not connected to its API server: {}", target.name(), reason);
                target.state.write().await.disconnect_from_api(&channels);
                PassOutcome::Continue
            }
            MonitorError::Api(ApiError::Request { endpoint, reason }) => {
                warn!("{} could not reach {}: {}", self.name(), endpoint, reason);
                let monitor = self.name().to_string();
                let is_validator = self.node().identity.is_validator;
                self.api_liveness_mut()
                    .set_api_as_down(&monitor, is_validator, &channels, now);
                PassOutcome::Continue
            }
            MonitorError::NoLiveSource(NoLiveSourceError::Indirect) => {
                warn!("{}: {}", self.name(), NoLiveSourceError::Indirect);
                channels.alert_critical(Alert::no_live_node_connected(self.name()));
                PassOutcome::Continue
            }
            MonitorError::NoLiveSource(NoLiveSourceError::Archive) => {
                self.mark_no_live_archive_node();
                PassOutcome::Continue
            }
            MonitorError::Store(reason) => PassOutcome::Restart(reason),
            e @ (MonitorError::Api(_)
            | MonitorError::Metrics(_)
            | MonitorError::GitHub(_)
            | MonitorError::Data(_)) => {
                warn!("{} error when reading data: {}", self.name(), e);
                channels.alert_error(Alert::error_when_reading_data(self.name(), &e.to_string()));
                PassOutcome::Continue
            }
        }
    }
}

impl Worker for NodeMonitor {
    fn name(&self) -> &str {
        NodeMonitor::name(self)
    }

    async fn run_once(&mut self) -> PassOutcome {
        self.run_pass().await
    }
}

impl SystemMonitor {
    pub async fn run_pass(&mut self) -> PassOutcome {
        let mut outcome = match self.monitor().await {
            Ok(()) => PassOutcome::Continue,
            Err(e) => {
                warn!("{} error when reading data: {}", self.name(), e);
                self.context()
                    .channels
                    .alert_error(Alert::error_when_reading_data(self.name(), &e.to_string()));
                PassOutcome::Continue
            }
        };

        if let Err(e) = self.save_state().await {
            error!("{} could not save state: {}", self.name(), e);
            outcome = PassOutcome::Restart(e.to_string());
        }

        outcome
    }
}

impl Worker for SystemMonitor {
    fn name(&self) -> &str {
        SystemMonitor::name(self)
    }

    async fn run_once(&mut self) -> PassOutcome {
        self.run_pass().await
    }
}

impl GitHubMonitor {
    /// Unreachable pages are alerted at most once per error interval;
    /// bodies that cannot be read are only logged
    pub async fn run_pass(&mut self) -> PassOutcome {
        let now = self.context().clock.now();

        match self.monitor().await {
            Ok(()) => {
                info!("{} status: {}", self.name(), self.status());
                self.error_alert_limiter_mut().reset();
            }
            Err(e @ GitHubError::Decode { .. }) => {
                warn!("{} ignoring unreadable releases: {}", self.name(), e);
            }
            Err(e) => {
                warn!("{} cannot access releases: {}", self.name(), e);
                if self.error_alert_limiter_mut().can_do_task(now) {
                    let alert = Alert::cannot_access_github_page(self.name(), self.releases_page());
                    self.context().channels.alert_error(alert);
                    self.error_alert_limiter_mut().did_task(now);
                }
            }
        }

        if let Err(e) = self.save_state().await {
            error!("{} could not save state: {}", self.name(), e);
            return PassOutcome::Restart(e.to_string());
        }

        PassOutcome::Continue
    }
}

impl Worker for GitHubMonitor {
    fn name(&self) -> &str {
        GitHubMonitor::name(self)
    }

    async fn run_once(&mut self) -> PassOutcome {
        self.run_pass().await
    }
}
