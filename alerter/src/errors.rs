//! Custom error types for the alerter
//!
//! Provides structured error handling for the chain API, the metrics scraper,
//! the persisted store and the monitoring passes built on top of them.

use std::fmt;

/// Errors raised by the chain API client
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The API server reported that a call against the node failed
    ApiCallFailed(String),

    /// The node is not (or no longer) registered with the API server
    NodeNotConnected(String),

    /// The API server returned an error we do not know how to handle
    UnexpectedApiCall(String),

    /// The response carried neither a result nor an error
    UnexpectedApiRead(String),

    /// The API server could not reach the node
    ConnectionLost(String),

    /// The consensus public key could not be parsed by the API server
    InvalidConsensusPublicKey(String),

    /// The API server itself could not be reached
    Request { endpoint: String, reason: String },

    /// The result did not have the expected shape
    Decode { endpoint: String, reason: String },
}

impl ApiError {
    /// Errors after which the worker for a node must stop for good
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApiError::UnexpectedApiCall(_)
                | ApiError::UnexpectedApiRead(_)
                | ApiError::InvalidConsensusPublicKey(_)
        )
    }
}

/// Errors raised by the Prometheus scraper
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    NoParametersGiven { endpoint: String },
    MetricNotFound { metric: String, endpoint: String },
    RequestFailed { endpoint: String, reason: String },
    Malformed { metric: String, reason: String },
}

/// Errors raised when reading the releases of a repository
#[derive(Debug, Clone, PartialEq)]
pub enum GitHubError {
    /// The releases page could not be reached
    Request { url: String, reason: String },

    /// GitHub answered with a non-success status
    Status { url: String, status: u16 },

    /// GitHub does not know the repository
    NotFound { url: String },

    /// The body was not a list of releases
    Decode { url: String, reason: String },
}

/// No data source satisfied the selection rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoLiveSourceError {
    /// No node connected with an API server was found
    Indirect,

    /// No archive node connected with an API server was found
    Archive,
}

/// Outcome of a failed monitoring pass
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    Api(ApiError),
    NoLiveSource(NoLiveSourceError),
    Metrics(MetricsError),
    GitHub(GitHubError),
    Store(String),
    Data(String),
}

impl MonitorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::Api(e) if e.is_fatal())
    }
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ApiCallFailed(msg) => write!(f, "API call failed: {}", msg),
            ApiError::NodeNotConnected(msg) => {
                write!(f, "Node was not connected to the API server: {}", msg)
            }
            ApiError::UnexpectedApiCall(msg) => write!(f, "Unexpected API call error: {}", msg),
            ApiError::UnexpectedApiRead(msg) => {
                write!(f, "Unexpected API error when reading data: {}", msg)
            }
            ApiError::ConnectionLost(msg) => write!(f, "Connection with node API lost: {}", msg),
            ApiError::InvalidConsensusPublicKey(msg) => {
                write!(f, "Invalid consensus public key: {}", msg)
            }
            ApiError::Request { endpoint, reason } => {
                write!(f, "Request to {} failed: {}", endpoint, reason)
            }
            ApiError::Decode { endpoint, reason } => {
                write!(f, "Could not interpret response from {}: {}", endpoint, reason)
            }
        }
    }
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::NoParametersGiven { endpoint } => {
                write!(f, "No parameters given for {}", endpoint)
            }
            MetricsError::MetricNotFound { metric, endpoint } => {
                write!(f, "Metric {} not found at endpoint {}", metric, endpoint)
            }
            MetricsError::RequestFailed { endpoint, reason } => {
                write!(f, "Failed to retrieve data from {}: {}", endpoint, reason)
            }
            MetricsError::Malformed { metric, reason } => {
                write!(f, "Metric {} is malformed: {}", metric, reason)
            }
        }
    }
}

impl fmt::Display for GitHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitHubError::Request { url, reason } => write!(f, "Could not reach {}: {}", url, reason),
            GitHubError::Status { url, status } => write!(f, "{} returned status {}", url, status),
            GitHubError::NotFound { url } => {
                write!(f, "Successfully reached {} but URL is not valid", url)
            }
            GitHubError::Decode { url, reason } => {
                write!(f, "Could not interpret releases from {}: {}", url, reason)
            }
        }
    }
}

impl fmt::Display for NoLiveSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoLiveSourceError::Indirect => {
                write!(f, "No live node connected with an API server was found")
            }
            NoLiveSourceError::Archive => {
                write!(f, "No live archive node connected with an API server was found")
            }
        }
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Api(e) => write!(f, "{}", e),
            MonitorError::NoLiveSource(e) => write!(f, "{}", e),
            MonitorError::Metrics(e) => write!(f, "{}", e),
            MonitorError::GitHub(e) => write!(f, "{}", e),
            MonitorError::Store(msg) => write!(f, "Store error: {}", msg),
            MonitorError::Data(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl std::error::Error for ApiError {}
impl std::error::Error for MetricsError {}
impl std::error::Error for GitHubError {}
impl std::error::Error for NoLiveSourceError {}
impl std::error::Error for MonitorError {}
impl std::error::Error for ConfigError {}

impl From<ApiError> for MonitorError {
    fn from(err: ApiError) -> Self {
        MonitorError::Api(err)
    }
}

impl From<NoLiveSourceError> for MonitorError {
    fn from(err: NoLiveSourceError) -> Self {
        MonitorError::NoLiveSource(err)
    }
}

impl From<MetricsError> for MonitorError {
    fn from(err: MetricsError) -> Self {
        MonitorError::Metrics(err)
    }
}

impl From<GitHubError> for MonitorError {
    fn from(err: GitHubError) -> Self {
        MonitorError::GitHub(err)
    }
}

impl From<sqlx::Error> for MonitorError {
    fn from(err: sqlx::Error) -> Self {
        MonitorError::Store(err.to_string())
    }
}
