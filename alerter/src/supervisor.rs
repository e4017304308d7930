//! Supervised worker loops
//!
//! Every worker runs one pass per period on its own task. A pass that fails
//! with a transient error is alerted and the loop restarts after a short
//! delay; a fatal failure is alerted and stops that worker for good. A worker
//! that panics is restarted with its state intact since it lives behind a
//! mutex owned by the supervisor.

use crate::alerts::Alert;
use crate::channels::ChannelSet;
use crate::constants::supervisor::RESTART_DELAY;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Result of one pass of a worker
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Sleep for the period and go again
    Continue,
    /// Alert the error and restart the loop
    Restart(String),
    /// Alert the error and stop the worker
    Stop(String),
}

pub trait Worker: Send + 'static {
    fn name(&self) -> &str;

    fn run_once(&mut self) -> impl Future<Output = PassOutcome> + Send;
}

pub struct Supervisor {
    tasks: JoinSet<()>,
    channels: Arc<ChannelSet>,
    restart_delay: Duration,
}

impl Supervisor {
    pub fn new(channels: Arc<ChannelSet>) -> Self {
        Self {
            tasks: JoinSet::new(),
            channels,
            restart_delay: RESTART_DELAY,
        }
    }

    pub fn with_restart_delay(mut self, restart_delay: Duration) -> Self {
        self.restart_delay = restart_delay;
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn spawn<W: Worker>(&mut self, worker: W, period: Duration) {
        let channels = self.channels.clone();
        let restart_delay = self.restart_delay;
        let name = worker.name().to_string();
        let worker = Arc::new(Mutex::new(worker));

        self.tasks.spawn(async move {
            loop {
                let run = tokio::spawn(run_loop(
                    worker.clone(),
                    channels.clone(),
                    period,
                    restart_delay,
                ));

                match run.await {
                    Ok(()) => break,
                    Err(e) if e.is_panic() => {
                        error!("{} panicked, restarting", name);
                        channels.alert_error(Alert::terminated_due_to_exception(&name, "worker panicked"));
                        tokio::time::sleep(restart_delay).await;
                    }
                    Err(e) => {
                        warn!("{} was cancelled: {}", name, e);
                        break;
                    }
                }
            }
        });
    }

    /// Waits until every worker has stopped
    pub async fn wait(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!("Supervised task failed: {}", e);
            }
        }
        info!("All workers stopped");
    }
}

// Returns only once the worker stops for good
async fn run_loop<W: Worker>(
    worker: Arc<Mutex<W>>,
    channels: Arc<ChannelSet>,
    period: Duration,
    restart_delay: Duration,
) {
    let name = worker.lock().await.name().to_string();
    info!("{} started.", name);

    loop {
        let outcome = worker.lock().await.run_once().await;

        match outcome {
            PassOutcome::Continue => tokio::time::sleep(period).await,
            PassOutcome::Restart(reason) => {
                channels.alert_error(Alert::terminated_due_to_exception(&name, &reason));
                info!("{} stopped.", name);
                tokio::time::sleep(restart_delay).await;
                info!("{} started.", name);
            }
            PassOutcome::Stop(reason) => {
                channels.alert_error(Alert::terminated_due_to_fatal_exception(&name, &reason));
                info!("{} stopped.", name);
                return;
            }
        }
    }
}
