//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, Bytes, TxHash, U256};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    constants::{
        LOCK_CONTRACT_NAME, LOCK_UNLOCK_DELAY_SECS, LOCK_VALUE, MARKETPLACE_CONTRACT_NAME,
        NOW_PLACEHOLDER, RES_TOKEN_CONTRACT_NAME,
    },
    utils::deserialize_json_args,
};

/// A single contract to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractSpec {
    /// The contract name, either bare (`Lock`) or fully qualified
    /// (`contracts/Lock.sol:Lock`)
    pub name: String,
    /// The constructor arguments, coerced against the constructor's ABI types
    #[serde(default, deserialize_with = "deserialize_json_args")]
    pub args: Vec<Value>,
    /// Overrides applied to the deployment transaction
    #[serde(default)]
    pub overrides: DeployOverrides,
    /// The key under which the deployed address is recorded in the
    /// deployments file
    #[serde(default)]
    pub key: Option<String>,
}

impl ContractSpec {
    /// A spec deploying `name` with the given arguments and no overrides
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
            overrides: DeployOverrides::default(),
            key: None,
        }
    }
}

/// Overrides for the deployment transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployOverrides {
    /// The value to attach, either an integer amount of wei (decimal or
    /// `0x` hex) or an amount with a unit, e.g. `1 gwei`
    #[serde(default)]
    pub value: Option<String>,
    /// An explicit gas limit, skipping estimation
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// A fully validated contract creation transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTx {
    /// The creation bytecode followed by the ABI-encoded constructor arguments
    pub init_code: Bytes,
    /// The value attached to the deployment
    pub value: U256,
    /// The gas limit override, if any
    pub gas_limit: Option<u64>,
}

/// The outcome of a confirmed deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// The address of the newly created contract
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: TxHash,
    /// The block in which the creation transaction was included
    pub block_number: Option<u64>,
    /// The gas consumed by the creation transaction
    pub gas_used: u64,
}

/// The built-in deployments
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    /// The marketplace contract
    Marketplace,
    /// The RES NFT collection
    Res,
    /// The RES fungible token
    ResToken,
    /// A time lock holding 1 gwei, unlocking a minute after deployment
    Lock,
}

impl Preset {
    /// The contract spec this preset deploys
    pub fn spec(self) -> ContractSpec {
        let mut spec = match self {
            Preset::Marketplace => ContractSpec::new(MARKETPLACE_CONTRACT_NAME, vec![]),
            Preset::Res => ContractSpec::new(
                RES_TOKEN_CONTRACT_NAME,
                vec![Value::from("RES NFT"), Value::from("RES")],
            ),
            Preset::ResToken => ContractSpec::new(
                RES_TOKEN_CONTRACT_NAME,
                vec![Value::from("RES Token"), Value::from("RESTK")],
            ),
            Preset::Lock => {
                let unlock_time = format!("${{{NOW_PLACEHOLDER}+{LOCK_UNLOCK_DELAY_SECS}}}");
                let mut spec = ContractSpec::new(LOCK_CONTRACT_NAME, vec![Value::from(unlock_time)]);
                spec.overrides.value = Some(LOCK_VALUE.to_string());
                spec
            }
        };

        spec.key = Some(self.to_string());
        spec
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Marketplace => write!(f, "marketplace"),
            Preset::Res => write!(f, "res"),
            Preset::ResToken => write!(f, "res-token"),
            Preset::Lock => write!(f, "lock"),
        }
    }
}
