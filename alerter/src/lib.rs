pub mod alerts;
pub mod alive_reminder;
pub mod api;
pub mod channels;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metrics;
pub mod monitor;
pub mod registry;
pub mod scaling;
pub mod startup;
pub mod state;
pub mod store;
pub mod supervisor;
pub mod timing;
pub mod web;

// Re-export commonly used types
pub use alerts::{Alert, AlertCode, Severity};
pub use channels::{ChannelSet, LogChannel, WebhookChannel};
pub use config::{Config, ConfigManager, NodeConfig};
pub use monitor::{GitHubMonitor, MonitorContext, NodeMonitor, SystemMonitor};
pub use registry::{NodeHandle, NodeRegistry};
pub use state::{NodeState, SystemState};
pub use store::Store;
pub use supervisor::Supervisor;
