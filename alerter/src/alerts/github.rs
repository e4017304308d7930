// File: alerter/src/alerts/github.rs
use super::{Alert, AlertCode};

impl Alert {
    pub fn new_github_release(repo: &str, release_name: &str, tag_name: &str) -> Self {
        Alert::new(
            AlertCode::NewGitHubRelease,
            repo,
            format!(
                "{} of {} has just been released with the tag {}.",
                release_name, repo, tag_name
            ),
        )
    }

    pub fn cannot_access_github_page(monitor: &str, releases_page: &str) -> Self {
        Alert::new(
            AlertCode::CannotAccessGitHubPage,
            monitor,
            format!("{}: cannot access the GitHub page {}.", monitor, releases_page),
        )
    }

    pub fn repo_inaccessible_during_startup(repo: &str) -> Self {
        Alert::new(
            AlertCode::RepoInaccessibleDuringStartup,
            repo,
            format!(
                "Repository {} was not accessible during startup. It will not be monitored.",
                repo
            ),
        )
    }
}
