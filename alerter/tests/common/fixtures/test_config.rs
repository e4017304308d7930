//! Test configuration builder writing config directories to a temp dir

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_config: MainConfigBuilder,
    extra_main_sections: Vec<String>,
    node_files: Vec<(String, Vec<NodeConfigBuilder>)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            main_config: MainConfigBuilder::default(),
            extra_main_sections: Vec::new(),
            node_files: Vec::new(),
        }
    }

    pub fn with_main_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MainConfigBuilder) -> MainConfigBuilder,
    {
        self.main_config = f(self.main_config);
        self
    }

    /// Raw TOML appended to main.toml
    pub fn with_section(mut self, toml: &str) -> Self {
        self.extra_main_sections.push(toml.to_string());
        self
    }

    pub fn with_nodes_file(mut self, file_name: &str, nodes: Vec<NodeConfigBuilder>) -> Self {
        self.node_files.push((file_name.to_string(), nodes));
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        let nodes_dir = config_dir.join("nodes");
        fs::create_dir_all(&nodes_dir).expect("Failed to create config dir");

        let mut main_toml = self.main_config.to_toml();
        for section in &self.extra_main_sections {
            main_toml.push_str(section);
        }
        fs::write(config_dir.join("main.toml"), main_toml).expect("Failed to write main.toml");

        for (file_name, nodes) in &self.node_files {
            let toml: String = nodes.iter().map(NodeConfigBuilder::to_toml).collect();
            fs::write(nodes_dir.join(format!("{}.toml", file_name)), toml)
                .expect("Failed to write nodes config");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestConfig {
    pub fn dir(&self) -> String {
        self.config_dir.to_string_lossy().to_string()
    }
}

#[derive(Clone)]
pub struct MainConfigBuilder {
    alerter_name: String,
    unique_identifier: String,
    webhook_url: String,
    node_monitor_period_seconds: u64,
}

impl MainConfigBuilder {
    pub fn alerter_name(mut self, name: &str) -> Self {
        self.alerter_name = name.to_string();
        self
    }

    pub fn webhook(mut self, url: &str) -> Self {
        self.webhook_url = url.to_string();
        self
    }

    pub fn node_monitor_period(mut self, seconds: u64) -> Self {
        self.node_monitor_period_seconds = seconds;
        self
    }

    fn to_toml(&self) -> String {
        format!(
            r#"
[general]
alerter_name = "{}"
unique_identifier = "{}"
webhook_url = "{}"

[monitoring_periods]
node_monitor_period_seconds = {}
system_monitor_period_seconds = 10
node_monitor_max_catch_up_blocks = 500
"#,
            self.alerter_name, self.unique_identifier, self.webhook_url, self.node_monitor_period_seconds
        )
    }
}

impl Default for MainConfigBuilder {
    fn default() -> Self {
        Self {
            alerter_name: "Test Alerter".to_string(),
            unique_identifier: "test".to_string(),
            webhook_url: String::new(),
            node_monitor_period_seconds: 10,
        }
    }
}

#[derive(Clone)]
pub struct NodeConfigBuilder {
    name: String,
    api_url: String,
    chain: String,
    is_validator: bool,
    staking_address: Option<String>,
    is_archive_node: bool,
    use_as_data_source: bool,
}

impl NodeConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            api_url: "http://localhost:8686".to_string(),
            chain: "test-chain".to_string(),
            is_validator: false,
            staking_address: None,
            is_archive_node: false,
            use_as_data_source: false,
        }
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn chain(mut self, chain: &str) -> Self {
        self.chain = chain.to_string();
        self
    }

    pub fn validator(mut self, staking_address: Option<&str>) -> Self {
        self.is_validator = true;
        self.staking_address = staking_address.map(str::to_string);
        self
    }

    pub fn archive(mut self) -> Self {
        self.is_archive_node = true;
        self
    }

    pub fn data_source(mut self) -> Self {
        self.use_as_data_source = true;
        self
    }

    fn to_toml(&self) -> String {
        let staking = self
            .staking_address
            .as_ref()
            .map(|a| format!("staking_address = \"{}\"\n", a))
            .unwrap_or_default();
        format!(
            r#"
[nodes.{}]
api_url = "{}"
chain = "{}"
is_validator = {}
node_public_key = "{}-key"
{}is_archive_node = {}
use_as_data_source = {}
"#,
            self.name,
            self.api_url,
            self.chain,
            self.is_validator,
            self.name,
            staking,
            self.is_archive_node,
            self.use_as_data_source
        )
    }
}
