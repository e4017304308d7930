//! Response shapes returned by the chain API server

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use std::collections::HashMap;

/// Accepts an integer encoded either as a JSON number or a string
pub fn u64_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| de::Error::custom(format!("{} is not an unsigned integer", n))),
        serde_json::Value::String(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected integer, found {}", other))),
    }
}

/// Token quantities are big integers sent as strings
pub fn u128_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| de::Error::custom(format!("{} is not an unsigned integer", n))),
        serde_json::Value::String(s) => s.trim().parse::<u128>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected quantity, found {}", other))),
    }
}

pub fn f64_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("{} is not a number", n))),
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected number, found {}", other))),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Gauge(#[serde(deserialize_with = "f64_from_any")] pub f64);

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    #[serde(deserialize_with = "u64_from_any")]
    pub height: u64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusBlock {
    #[serde(deserialize_with = "u64_from_any")]
    pub height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionValidator {
    pub id: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub voting_power: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Precommit {
    #[serde(default)]
    pub validator_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedBlock {
    #[serde(default)]
    pub signatures: Vec<Option<Precommit>>,
}

impl SignedBlock {
    /// Addresses of the validators whose precommit is present
    pub fn signers(&self) -> std::collections::HashSet<&str> {
        self.signatures
            .iter()
            .flatten()
            .map(|p| p.validator_address.as_str())
            .filter(|a| !a.is_empty())
            .collect()
    }

    pub fn missing_validators(&self) -> usize {
        self.signatures.len().saturating_sub(self.signers().len())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    #[serde(deserialize_with = "u128_from_any")]
    pub balance: u128,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Escrow {
    pub active: Balance,
    pub debonding: Balance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakingAccount {
    pub escrow: Escrow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delegation {
    #[serde(deserialize_with = "u128_from_any")]
    pub shares: u128,
}

/// Delegations keyed by delegator address
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Delegations(pub Option<HashMap<String, Delegation>>);

impl Delegations {
    pub fn total_shares(&self) -> u128 {
        self.0
            .as_ref()
            .map(|d| d.values().map(|d| d.shares).sum())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusInfo {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryNode {
    pub entity_id: String,
    pub consensus: ConsensusInfo,
}
