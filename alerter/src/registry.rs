//! Index of the initialised nodes and the roles they play
//!
//! A node can be monitored, used as a data source for other nodes of its
//! chain, or both. Its state is shared through a [`NodeHandle`]; writers take
//! the write lock for the duration of one update so each state change is
//! applied as a unit.

use crate::state::{NodeIdentity, NodeState};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Clone)]
pub struct NodeHandle {
    pub identity: Arc<NodeIdentity>,
    pub state: Arc<RwLock<NodeState>>,
}

impl NodeHandle {
    pub fn new(state: NodeState) -> Self {
        Self {
            identity: state.identity().clone(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn chain(&self) -> &str {
        &self.identity.chain
    }

    pub async fn is_down(&self) -> bool {
        self.state.read().await.is_down()
    }

    pub async fn finalized_block_height(&self) -> u64 {
        self.state.read().await.finalized_block_height()
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle").field("name", &self.identity.name).finish()
    }
}

struct Entry {
    handle: NodeHandle,
    monitor_node: bool,
    use_as_data_source: bool,
}

#[derive(Default)]
pub struct NodeRegistry {
    entries: Vec<Entry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: NodeHandle, monitor_node: bool, use_as_data_source: bool) {
        self.entries.push(Entry {
            handle,
            monitor_node,
            use_as_data_source,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&NodeHandle> {
        self.entries
            .iter()
            .map(|e| &e.handle)
            .find(|h| h.name() == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &NodeHandle> {
        self.entries.iter().map(|e| &e.handle)
    }

    pub fn monitored(&self) -> Vec<NodeHandle> {
        self.entries
            .iter()
            .filter(|e| e.monitor_node)
            .map(|e| e.handle.clone())
            .collect()
    }

    fn data_sources_of_chain<'a>(&'a self, chain: &'a str) -> impl Iterator<Item = &'a NodeHandle> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.use_as_data_source && e.handle.chain() == chain)
            .map(|e| &e.handle)
    }

    /// Data sources for indirect monitoring of `node`: the other data sources
    /// of its chain in registration order, then the node itself if it is one
    pub fn data_sources_for(&self, node: &NodeHandle) -> Vec<NodeHandle> {
        let mut sources: Vec<NodeHandle> = self
            .data_sources_of_chain(node.chain())
            .filter(|h| h.name() != node.name())
            .cloned()
            .collect();

        let node_is_source = self
            .entries
            .iter()
            .any(|e| e.use_as_data_source && e.handle.name() == node.name());
        if node_is_source {
            sources.push(node.clone());
        }

        if sources.is_empty() {
            info!(
                "Indirect monitoring will be disabled for node {} because no data source for chain {} was given",
                node.name(),
                node.chain()
            );
        }
        sources
    }

    pub fn monitored_chains(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| e.monitor_node)
            .map(|e| e.handle.chain().to_string())
            .collect()
    }

    /// Archive monitoring needs at least one archive data source on the chain
    pub fn archive_alerts_disabled(&self, chain: &str) -> bool {
        let mut sources = self.data_sources_of_chain(chain).peekable();
        if sources.peek().is_none() {
            info!(
                "No node of chain {} was set as a data source, blockchain monitoring is disabled for it",
                chain
            );
            return true;
        }

        let disabled = !sources.any(|h| h.identity.is_archive_node);
        if disabled {
            warn!(
                "No data source of chain {} is an archive node, archive monitoring will be disabled for it",
                chain
            );
        }
        disabled
    }
}
