//! # Deployment Address Book
//!
//! Deployments generated at build time, keyed by chain id:
//!
//! ```json
//! { "31337": { "address": "0x5FbD...", "chainId": 31337, "chainName": "Hardhat" } }
//! ```
//!
//! A chain that is missing, or whose entry carries the zero address, has no
//! deployment.

use crate::config::ConfigError;
use crate::ports::DeploymentResolver;
use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{chain_name, Address, ChainId, DeploymentInfo, ZERO_ADDRESS};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    address: String,
    chain_id: Option<ChainId>,
    chain_name: Option<String>,
}

/// Static deployment table.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: BTreeMap<ChainId, DeploymentInfo>,
}

impl AddressBook {
    /// Empty book: nothing is deployed anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the generated addresses JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: HashMap<String, RawEntry> = serde_json::from_str(raw)?;
        let mut book = Self::new();

        for (key, entry) in parsed {
            let key_chain: ChainId = key
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("chain key {key:?} is not a number")))?;
            let chain_id = entry.chain_id.unwrap_or(key_chain);
            if chain_id != key_chain {
                return Err(ConfigError::Invalid(format!(
                    "entry {key} declares chainId {chain_id}"
                )));
            }

            let address = parse_address(&entry.address)?;
            if address == ZERO_ADDRESS {
                continue;
            }
            book.entries.insert(
                chain_id,
                DeploymentInfo {
                    address,
                    chain_id,
                    chain_name: entry.chain_name.unwrap_or_else(|| display_name(chain_id)),
                },
            );
        }
        Ok(book)
    }

    /// Read and parse an addresses file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Add a deployment, naming the chain from the well-known list.
    pub fn with_entry(mut self, chain_id: ChainId, address: Address) -> Self {
        self.entries.insert(
            chain_id,
            DeploymentInfo {
                address,
                chain_id,
                chain_name: display_name(chain_id),
            },
        );
        self
    }

    /// Deployment on `chain_id`, if any.
    pub fn get(&self, chain_id: ChainId) -> Option<&DeploymentInfo> {
        self.entries.get(&chain_id)
    }

    /// Chains with a deployment.
    pub fn chains(&self) -> Vec<ChainId> {
        self.entries.keys().copied().collect()
    }

    /// Number of deployments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is deployed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DeploymentResolver for AddressBook {
    async fn resolve(&self, chain_id: ChainId) -> Option<DeploymentInfo> {
        self.get(chain_id).cloned()
    }
}

fn display_name(chain_id: ChainId) -> String {
    chain_name(chain_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Chain {chain_id}"))
}

fn parse_address(raw: &str) -> Result<Address, ConfigError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(digits)
        .map_err(|e| ConfigError::Invalid(format!("address {raw:?}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ConfigError::Invalid(format!("address {raw:?} is not 20 bytes")))
}
