use crate::alerts::Alert;
use crate::api::github::{GitHubApi, Release};
use crate::config::RepoConfig;
use crate::errors::{GitHubError, MonitorError};
use crate::monitor::MonitorContext;
use crate::store::keys;
use crate::timing::TimedTaskLimiter;
use chrono::Duration;
use tracing::{debug, info, warn};

/// Announces new releases of one GitHub repository
///
/// The id of the newest release seen is kept (and persisted), so releases
/// published while the alerter was down are reported on the next pass.
pub struct GitHubMonitor {
    name: String,
    repo_name: String,
    releases_page: String,
    github: GitHubApi,
    last_release_id: Option<u64>,
    error_alert_limiter: TimedTaskLimiter,
    ctx: MonitorContext,
}

impl GitHubMonitor {
    pub fn new(repo: &RepoConfig, github: GitHubApi, error_interval_seconds: u64, ctx: MonitorContext) -> Self {
        Self {
            name: format!("GitHub monitor ({})", repo.name),
            repo_name: repo.name.clone(),
            releases_page: github.releases_page(&repo.repo_page),
            github,
            last_release_id: None,
            error_alert_limiter: TimedTaskLimiter::new(Duration::seconds(error_interval_seconds as i64)),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn releases_page(&self) -> &str {
        &self.releases_page
    }

    pub fn last_release_id(&self) -> Option<u64> {
        self.last_release_id
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub(crate) fn error_alert_limiter_mut(&mut self) -> &mut TimedTaskLimiter {
        &mut self.error_alert_limiter
    }

    pub fn status(&self) -> String {
        match self.last_release_id {
            Some(id) => format!("last_release_id={}", id),
            None => "last_release_id=None".to_string(),
        }
    }

    pub async fn load_state(&mut self) -> Result<(), MonitorError> {
        let Some(store) = self.ctx.store.clone() else {
            return Ok(());
        };

        let key = keys::github_last_release_id(&self.repo_name);
        self.last_release_id = store
            .get_int(&key)
            .await?
            .and_then(|id| u64::try_from(id).ok());
        debug!("Restored {} state: {}={:?}", self.name, key, self.last_release_id);
        Ok(())
    }

    pub async fn save_state(&self) -> Result<(), MonitorError> {
        let (Some(store), Some(id)) = (self.ctx.store.as_ref(), self.last_release_id) else {
            return Ok(());
        };

        debug!("Saving {} state: last_release_id={}", self.name, id);
        store
            .set(&keys::github_last_release_id(&self.repo_name), &id.to_string())
            .await?;
        Ok(())
    }

    /// Reads the releases page and alerts every release newer than the last
    /// one seen, oldest first
    pub async fn monitor(&mut self) -> Result<(), GitHubError> {
        let releases = self.github.get_releases(&self.releases_page).await?;
        let Some(newest) = releases.first() else {
            debug!("{} found no releases", self.name);
            return Ok(());
        };

        match self.last_release_id {
            None => info!(
                "{} found {} releases, newest is {}",
                self.name,
                releases.len(),
                newest.tag_name
            ),
            Some(last) if last == newest.id => debug!("{} no new releases", self.name),
            Some(last) => match releases.iter().position(|r| r.id == last) {
                Some(seen) => {
                    for release in releases[..seen].iter().rev() {
                        self.announce(release);
                    }
                }
                None => warn!(
                    "{} no longer lists release {}, taking {} as the newest without alerting",
                    self.name, last, newest.tag_name
                ),
            },
        }

        self.last_release_id = Some(newest.id);
        Ok(())
    }

    fn announce(&self, release: &Release) {
        info!("{} new release {}", self.name, release.tag_name);
        self.ctx.channels.alert_info(Alert::new_github_release(
            &self.repo_name,
            release.display_name(),
            &release.tag_name,
        ));
    }
}
