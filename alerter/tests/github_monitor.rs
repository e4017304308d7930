mod common;

use alerter::alerts::{AlertCode, Severity};
use alerter::api::{GitHubApi, OasisApi};
use alerter::config::{RepoConfig, StoreConfig};
use alerter::startup::initialise_repositories;
use alerter::store::{keys, Store};
use alerter::supervisor::PassOutcome;
use alerter::timing::ManualClock;
use alerter::{GitHubMonitor, MonitorContext};
use chrono::Duration;
use common::fixtures::*;
use std::sync::Arc;

const ERROR_INTERVAL_SECONDS: u64 = 3600;

struct Harness {
    counter: Arc<CounterChannel>,
    clock: Arc<ManualClock>,
    ctx: MonitorContext,
}

fn harness(store: Option<Arc<Store>>) -> Harness {
    let counter = CounterChannel::new();
    let clock = Arc::new(ManualClock::new(start_time()));
    let ctx = MonitorContext {
        api: OasisApi::new().unwrap(),
        channels: Arc::new(CounterChannel::channel_set(&counter)),
        store,
        store_config: StoreConfig::default(),
        clock: clock.clone(),
    };
    Harness { counter, clock, ctx }
}

fn repo(name: &str, repo_page: &str) -> RepoConfig {
    RepoConfig {
        name: name.to_string(),
        repo_page: repo_page.to_string(),
        monitor_repo: true,
    }
}

fn monitor(h: &Harness, github: &MockGitHubServer) -> GitHubMonitor {
    GitHubMonitor::new(
        &repo("oasis-core", REPO_PAGE),
        GitHubApi::new(github.base_url.clone()).unwrap(),
        ERROR_INTERVAL_SECONDS,
        h.ctx.clone(),
    )
}

#[tokio::test]
async fn first_pass_only_records_the_newest_release() {
    let github = MockGitHubServer::start().await;
    github.mock_releases(REPO_PAGE, &[(30, "v22.2"), (20, "v22.1")]).await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);

    assert_eq!(monitor.name(), "GitHub monitor (oasis-core)");
    assert_eq!(
        monitor.releases_page(),
        format!("{}/repos/{}/releases", github.base_url, REPO_PAGE)
    );
    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(monitor.last_release_id(), Some(30));
    assert_eq!(h.counter.total(), 0);

    // Nothing new on the next pass
    monitor.run_pass().await;
    assert_eq!(h.counter.total(), 0);
}

#[tokio::test]
async fn new_releases_are_announced_oldest_first() {
    let github = MockGitHubServer::start().await;
    github.mock_releases(REPO_PAGE, &[(20, "v22.1")]).await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);
    monitor.run_pass().await;

    github.reset().await;
    github
        .mock_releases(REPO_PAGE, &[(40, "v22.3"), (30, "v22.2"), (20, "v22.1")])
        .await;
    monitor.run_pass().await;

    assert_eq!(
        h.counter.events(),
        vec![
            (Severity::Info, AlertCode::NewGitHubRelease),
            (Severity::Info, AlertCode::NewGitHubRelease),
        ]
    );
    let messages: Vec<String> = h.counter.alerts().into_iter().map(|a| a.message).collect();
    assert_eq!(
        messages,
        vec![
            "Release v22.2 of oasis-core has just been released with the tag v22.2.",
            "Release v22.3 of oasis-core has just been released with the tag v22.3.",
        ]
    );
    assert_eq!(monitor.last_release_id(), Some(40));
}

#[tokio::test]
async fn vanished_last_release_is_not_announced() {
    let github = MockGitHubServer::start().await;
    github.mock_releases(REPO_PAGE, &[(20, "v22.1")]).await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);
    monitor.run_pass().await;

    github.reset().await;
    github.mock_releases(REPO_PAGE, &[(30, "v22.2"), (10, "v22.0")]).await;
    monitor.run_pass().await;

    assert_eq!(h.counter.total(), 0);
    assert_eq!(monitor.last_release_id(), Some(30));
}

#[tokio::test]
async fn last_release_survives_a_restart() {
    let github = MockGitHubServer::start().await;
    github.mock_releases(REPO_PAGE, &[(20, "v22.1")]).await;

    let store = Arc::new(Store::in_memory("test").await.unwrap());
    let h = harness(Some(store.clone()));
    let mut first = monitor(&h, &github);
    first.run_pass().await;

    assert_eq!(
        store
            .get_int(&keys::github_last_release_id("oasis-core"))
            .await
            .unwrap(),
        Some(20)
    );

    // Released while the alerter was down
    github.reset().await;
    github.mock_releases(REPO_PAGE, &[(30, "v22.2"), (20, "v22.1")]).await;

    let mut restarted = monitor(&h, &github);
    restarted.load_state().await.unwrap();
    assert_eq!(restarted.last_release_id(), Some(20));

    restarted.run_pass().await;
    assert_eq!(h.counter.events(), vec![(Severity::Info, AlertCode::NewGitHubRelease)]);
}

#[tokio::test]
async fn unreachable_page_is_alerted_once_per_interval() {
    let github = MockGitHubServer::start().await;
    github.mock_status(REPO_PAGE, 502).await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(h.counter.events(), vec![(Severity::Error, AlertCode::CannotAccessGitHubPage)]);

    h.clock.advance(Duration::seconds(ERROR_INTERVAL_SECONDS as i64 - 1));
    monitor.run_pass().await;
    assert_eq!(h.counter.total(), 1);

    h.clock.advance(Duration::seconds(1));
    monitor.run_pass().await;
    assert_eq!(h.counter.count_code(AlertCode::CannotAccessGitHubPage), 2);
}

#[tokio::test]
async fn reaching_the_page_again_rearms_the_error_alert() {
    let github = MockGitHubServer::start().await;
    github.mock_status(REPO_PAGE, 500).await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);
    monitor.run_pass().await;

    github.reset().await;
    github.mock_releases(REPO_PAGE, &[(20, "v22.1")]).await;
    h.clock.advance(Duration::seconds(60));
    monitor.run_pass().await;

    github.reset().await;
    github.mock_status(REPO_PAGE, 500).await;
    h.clock.advance(Duration::seconds(60));
    monitor.run_pass().await;

    assert_eq!(
        h.counter.events(),
        vec![
            (Severity::Error, AlertCode::CannotAccessGitHubPage),
            (Severity::Error, AlertCode::CannotAccessGitHubPage),
        ]
    );
}

#[tokio::test]
async fn unreadable_body_is_ignored() {
    let github = MockGitHubServer::start().await;
    github.mock_body(REPO_PAGE, "<html>rate limited</html>").await;

    let h = harness(None);
    let mut monitor = monitor(&h, &github);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(monitor.last_release_id(), None);
    assert_eq!(h.counter.total(), 0);
}

#[tokio::test]
async fn inaccessible_repositories_are_reported_at_startup() {
    let github = MockGitHubServer::start().await;
    github.mock_releases(REPO_PAGE, &[(20, "v22.1")]).await;
    github.mock_not_found("oasisprotocol/does-not-exist").await;

    let counter = CounterChannel::new();
    let channels = CounterChannel::channel_set(&counter);
    let api = GitHubApi::new(github.base_url.clone()).unwrap();

    let reachable = initialise_repositories(
        &api,
        &[
            repo("oasis-core", REPO_PAGE),
            repo("missing", "oasisprotocol/does-not-exist"),
        ],
        &channels,
    )
    .await;

    let names: Vec<&str> = reachable.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["oasis-core"]);
    assert_eq!(
        counter.events(),
        vec![(Severity::Warning, AlertCode::RepoInaccessibleDuringStartup)]
    );
    assert_eq!(counter.alerts()[0].origin, "missing");
}

#[tokio::test]
async fn unreachable_github_fails_startup_check() {
    let counter = CounterChannel::new();
    let channels = CounterChannel::channel_set(&counter);
    let api = GitHubApi::new("http://127.0.0.1:1").unwrap();

    let reachable = initialise_repositories(&api, &[repo("oasis-core", REPO_PAGE)], &channels).await;

    assert!(reachable.is_empty());
    assert_eq!(counter.count_code(AlertCode::RepoInaccessibleDuringStartup), 1);
}
