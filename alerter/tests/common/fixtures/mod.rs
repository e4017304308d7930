//! This module provides reusable test utilities:
//! - Mock HTTP servers (chain API, metrics exporter, webhook, GitHub)
//! - A recording alert channel
//! - Test configuration and node builders

// Allow unused code in test fixtures - not every test uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod counter_channel;
pub mod mock_api;
pub mod mock_exporter;
pub mod mock_github;
pub mod mock_webhook;
pub mod test_config;
pub mod test_nodes;

// Re-export commonly used items
pub use counter_channel::CounterChannel;
pub use mock_api::MockApiServer;
pub use mock_exporter::MockExporterServer;
pub use mock_github::{MockGitHubServer, REPO_PAGE};
pub use mock_webhook::MockWebhookServer;
pub use test_config::{NodeConfigBuilder, TestConfigBuilder};
pub use test_nodes::*;
