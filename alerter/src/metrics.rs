//! Prometheus text-format scraper
//!
//! Understands the subset of the exposition format node exporters emit:
//! comment lines, `name value [timestamp]` and
//! `name{label="value",...} value [timestamp]`.

use crate::errors::MetricsError;
use anyhow::anyhow;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Unlabeled samples; repeated samples are summed
    Single(f64),
    Labeled(Vec<(Labels, f64)>),
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    endpoint: String,
    values: HashMap<String, MetricValue>,
}

impl MetricsSnapshot {
    pub fn new(endpoint: impl Into<String>, values: HashMap<String, MetricValue>) -> Self {
        Self {
            endpoint: endpoint.into(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Result<&MetricValue, MetricsError> {
        self.values.get(name).ok_or_else(|| MetricsError::MetricNotFound {
            metric: name.to_string(),
            endpoint: self.endpoint.clone(),
        })
    }

    /// Value of an unlabeled metric, or the sum over all label sets
    pub fn single(&self, name: &str) -> Result<f64, MetricsError> {
        match self.get(name)? {
            MetricValue::Single(v) => Ok(*v),
            MetricValue::Labeled(samples) => Ok(samples.iter().map(|(_, v)| v).sum()),
        }
    }

    pub fn labeled(&self, name: &str) -> Result<&[(Labels, f64)], MetricsError> {
        match self.get(name)? {
            MetricValue::Labeled(samples) => Ok(samples),
            MetricValue::Single(_) => Err(MetricsError::Malformed {
                metric: name.to_string(),
                reason: "expected labeled samples".to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct MetricsScraper {
    client: Client,
}

impl MetricsScraper {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for metrics scraping: {}", e))?;
        Ok(Self { client })
    }

    /// Fetches the named metrics; metrics absent from the endpoint are
    /// reported when read from the snapshot
    pub async fn get_metrics(&self, endpoint: &str, names: &[&str]) -> Result<MetricsSnapshot, MetricsError> {
        if names.is_empty() {
            return Err(MetricsError::NoParametersGiven {
                endpoint: endpoint.to_string(),
            });
        }

        let request_failed = |e: reqwest::Error| MetricsError::RequestFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        };
        let text = self
            .client
            .get(endpoint)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(request_failed)?
            .text()
            .await
            .map_err(request_failed)?;
        debug!("Retrieved prometheus data from endpoint: {}", endpoint);

        let values = parse_metrics(&text, names);
        for name in names {
            if !values.contains_key(*name) {
                warn!("Metric {} not found at endpoint {}", name, endpoint);
            }
        }

        Ok(MetricsSnapshot::new(endpoint, values))
    }
}

/// Collects the samples of the wanted metrics from an exposition body
pub fn parse_metrics(text: &str, wanted: &[&str]) -> HashMap<String, MetricValue> {
    let mut values: HashMap<String, MetricValue> = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, labels, value)) = parse_sample(line) else {
            debug!("Skipping unparsable metrics line: {}", line);
            continue;
        };
        if !wanted.contains(&name) {
            continue;
        }

        match (values.get_mut(name), labels.is_empty()) {
            (None, true) => {
                values.insert(name.to_string(), MetricValue::Single(value));
            }
            (None, false) => {
                values.insert(name.to_string(), MetricValue::Labeled(vec![(labels, value)]));
            }
            (Some(MetricValue::Single(total)), true) => *total += value,
            (Some(MetricValue::Labeled(samples)), false) => samples.push((labels, value)),
            (Some(_), _) => {
                warn!("Metric {} mixes labeled and unlabeled samples, ignoring one", name);
            }
        }
    }

    values
}

fn parse_sample(line: &str) -> Option<(&str, Labels, f64)> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(line.len());
    let name = &line[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut rest = &line[name_end..];
    let mut labels = Labels::new();
    if rest.starts_with('{') {
        let (parsed, after) = parse_labels(&rest[1..])?;
        labels = parsed;
        rest = after;
    }

    let value = rest.split_whitespace().next()?;
    let value = value.parse::<f64>().ok()?;
    Some((name, labels, value))
}

// Parses `key="value",...}` and returns what follows the closing brace.
fn parse_labels(input: &str) -> Option<(Labels, &str)> {
    let mut labels = Labels::new();
    let mut chars = input.char_indices().peekable();

    loop {
        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let (start, c) = *chars.peek()?;
        if c == '}' {
            return Some((labels, &input[start + 1..]));
        }

        let eq = input[start..].find('=')? + start;
        let key = input[start..eq].trim().to_string();
        while let Some((i, _)) = chars.peek() {
            if *i > eq {
                break;
            }
            chars.next();
        }
        if chars.next()?.1 != '"' {
            return None;
        }

        let mut value = String::new();
        loop {
            let (_, c) = chars.next()?;
            match c {
                '\\' => match chars.next()?.1 {
                    'n' => value.push('\n'),
                    other => value.push(other),
                },
                '"' => break,
                other => value.push(other),
            }
        }
        labels.insert(key, value);
    }
}
