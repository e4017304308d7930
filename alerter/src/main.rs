// File: alerter/src/main.rs
use alerter::alive_reminder::AliveReminder;
use alerter::api::{GitHubApi, OasisApi};
use alerter::channels::Channel;
use alerter::constants;
use alerter::metrics::MetricsScraper;
use alerter::startup::{initialise_nodes, initialise_repositories};
use alerter::timing::{SharedClock, SystemClock};
use alerter::web::{start_web_server, AppState};
use alerter::{
    ChannelSet, ConfigManager, GitHubMonitor, LogChannel, MonitorContext, NodeMonitor, Store,
    Supervisor, SystemMonitor, SystemState, WebhookChannel,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("alerter=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting node alerter");

    let config_manager = ConfigManager::new("config".to_string()).await?;
    let config = config_manager.get_current_config();
    let general = &config.general;
    info!(
        "Configuration loaded: {} nodes for {}",
        config.nodes.len(),
        general.alerter_name
    );

    let store = match &general.database_path {
        Some(path) => {
            let store = Store::new(path, &general.unique_identifier).await?;
            info!("Store initialized at {}", path);
            Some(Arc::new(store))
        }
        None => {
            warn!("No database_path configured, state will not be persisted");
            None
        }
    };

    let mut channel_list: Vec<Arc<dyn Channel>> = vec![Arc::new(LogChannel::new("log"))];
    let webhook = WebhookChannel::spawn(
        "webhook",
        general.webhook_url.clone(),
        general.alerter_name.clone(),
    )?;
    if webhook.is_enabled() {
        channel_list.push(Arc::new(webhook));
    } else {
        warn!("No webhook_url configured, alerts only go to the log");
    }
    let channels = Arc::new(ChannelSet::new(channel_list, config.alert_filter()));
    info!("Enabled alert channels: {:?}", channels.enabled_channels_list());

    let api = OasisApi::new()?;
    let clock: SharedClock = Arc::new(SystemClock);

    let registry = initialise_nodes(
        &api,
        &config.nodes,
        &config.alert_intervals_and_limits,
        &channels,
        store.as_deref(),
        &clock,
    )
    .await;
    if registry.is_empty() {
        error!("No node could be initialised");
    }
    let registry = Arc::new(registry);

    let github = GitHubApi::new(config.github.api_url.clone())?;
    let repositories =
        initialise_repositories(&github, &config.monitored_repositories(), &channels).await;

    let ctx = MonitorContext {
        api,
        channels: channels.clone(),
        store: store.clone(),
        store_config: config.store.clone(),
        clock,
    };

    let periods = &config.monitoring_periods;
    let mut supervisor = Supervisor::new(channels.clone());

    for node in registry.monitored() {
        let data_sources = registry.data_sources_for(&node);
        let archive_alerts_disabled = registry.archive_alerts_disabled(node.chain());
        let mut monitor = NodeMonitor::new(
            node,
            ctx.clone(),
            periods.node_monitor_max_catch_up_blocks,
            data_sources,
            archive_alerts_disabled,
        );
        if let Err(e) = monitor.load_state().await {
            warn!("Could not load saved state of {}: {}", monitor.name(), e);
        }
        supervisor.spawn(
            monitor,
            Duration::from_secs(periods.node_monitor_period_seconds),
        );
    }

    let mut systems = Vec::new();
    for node in config.nodes.iter().filter(|n| registry.get(&n.name).is_some()) {
        let Some(exporter_url) = node.exporter_url.clone() else {
            continue;
        };

        let bands = if node.is_validator {
            config.system_intervals_and_limits.validator.clone()
        } else {
            config.system_intervals_and_limits.node.clone()
        };
        let mut system = SystemState::new(&node.name, &node.chain, node.is_validator, bands);
        if let Some(store) = store.as_deref() {
            if let Err(e) = system.load_state(store).await {
                warn!("Could not load saved state of system {}: {}", node.name, e);
            }
        }

        let system = Arc::new(RwLock::new(system));
        systems.push(system.clone());

        let scraper = MetricsScraper::new(constants::metrics::REQUEST_TIMEOUT)?;
        supervisor.spawn(
            SystemMonitor::new(system, scraper, exporter_url, ctx.clone()),
            Duration::from_secs(periods.system_monitor_period_seconds),
        );
    }

    for repo in &repositories {
        let mut monitor = GitHubMonitor::new(
            repo,
            github.clone(),
            config.github.error_interval_seconds,
            ctx.clone(),
        );
        if let Err(e) = monitor.load_state().await {
            warn!("Could not load saved state of {}: {}", monitor.name(), e);
        }
        supervisor.spawn(
            monitor,
            Duration::from_secs(periods.github_monitor_period_seconds),
        );
    }

    info!("Started {} monitors", supervisor.len());

    let _alive_reminder = if config.periodic_alive_reminder.enabled {
        let reminder = AliveReminder::new(
            general.alerter_name.clone(),
            &config.periodic_alive_reminder,
            channels.clone(),
            store.clone(),
        )
        .await?;
        reminder.start().await?;
        Some(reminder)
    } else {
        info!("Periodic alive reminder disabled");
        None
    };

    let state = AppState::new(&general.alerter_name, registry.clone(), systems, store.clone());
    let web_host = general.web_host.clone();
    let web_port = general.web_port;

    tokio::select! {
        result = start_web_server(state, &web_host, web_port) => {
            if let Err(e) = result {
                error!("Web server failed: {}", e);
                return Err(e);
            }
        }
        _ = supervisor.wait() => {
            warn!("Every monitor has stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
