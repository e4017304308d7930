// File: alerter/src/config/manager.rs
use super::{Config, NodesConfigFile};
use anyhow::{anyhow, Result};
use glob::glob;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content = fs::read_to_string(&main_config_path).await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path, e))?;

        let mut config: Config = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        for (repo_name, repo) in config.repositories.iter_mut() {
            repo.name = repo_name.clone();
        }

        // Node files are read in path order so data source order is stable
        let pattern = format!("{}/nodes/*.toml", config_dir);
        let mut all_nodes = Vec::new();

        for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
            let path = entry.map_err(|e| anyhow!("Glob entry error: {}", e))?;

            debug!("Loading nodes config: {}", path.display());

            let content = fs::read_to_string(&path).await
                .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

            let nodes_file: NodesConfigFile = toml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

            for (node_name, mut node_config) in nodes_file.nodes {
                if all_nodes.iter().any(|n: &super::NodeConfig| n.name == node_name) {
                    return Err(anyhow!(
                        "Node {} is defined more than once (again in {})",
                        node_name,
                        path.display()
                    ));
                }
                node_config.name = node_name;
                all_nodes.push(node_config);
            }
        }

        config.nodes = all_nodes;
        config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

        info!(
            "Loaded {} nodes across {} chains and {} repositories",
            config.nodes.len(),
            config.chains().len(),
            config.repositories.len()
        );

        Ok(config)
    }
}

impl Config {
    /// Distinct chain ids in configuration order
    pub fn chains(&self) -> Vec<String> {
        let mut chains: Vec<String> = Vec::new();
        for node in &self.nodes {
            if !chains.contains(&node.chain) {
                chains.push(node.chain.clone());
            }
        }
        chains
    }
}
