//! Deployment plans: a JSON file listing contracts to deploy in order, and
//! the placeholders their arguments may use.
//!
//! A string argument that is exactly `${...}` is replaced before encoding:
//! - `${now}`, `${now+N}`, `${now-N}`: the current unix time in seconds,
//!   offset by N
//! - `${deployed:KEY}`: the address deployed under KEY earlier in this run,
//!   or recorded under KEY in the deployments file

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    constants::{DEPLOYED_PLACEHOLDER_PREFIX, NOW_PLACEHOLDER},
    errors::ScriptError,
    types::ContractSpec,
    utils::parse_addr_from_deployments_file,
};

/// An ordered list of contracts to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentPlan {
    /// The contracts, deployed in order
    pub contracts: Vec<ContractSpec>,
}

impl DeploymentPlan {
    /// Read a plan from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::PlanParsing(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Parse a plan from its JSON representation
    pub fn from_json(contents: &str) -> Result<Self, ScriptError> {
        let plan: Self =
            serde_json::from_str(contents).map_err(|e| ScriptError::PlanParsing(e.to_string()))?;

        if plan.contracts.is_empty() {
            return Err(ScriptError::PlanParsing("plan lists no contracts".to_string()));
        }

        Ok(plan)
    }
}

/// The values placeholders expand to
#[derive(Debug, Clone)]
pub struct Placeholders {
    /// The unix timestamp `${now}` expands to, fixed for the whole run
    now: u64,
    /// Addresses deployed during this run, by key
    deployed: HashMap<String, Address>,
    /// The deployments file consulted for keys not deployed in this run
    deployments_path: Option<PathBuf>,
}

impl Placeholders {
    /// Placeholders anchored at the current time
    pub fn new(deployments_path: Option<PathBuf>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self::at(now, deployments_path)
    }

    /// Placeholders anchored at a fixed unix timestamp
    pub fn at(now: u64, deployments_path: Option<PathBuf>) -> Self {
        Self {
            now,
            deployed: HashMap::new(),
            deployments_path,
        }
    }

    /// Make an address available to later `${deployed:KEY}` placeholders
    pub fn record(&mut self, key: &str, address: Address) {
        self.deployed.insert(key.to_string(), address);
    }

    /// Expand every placeholder in `args`, descending into arrays
    pub fn expand(&self, args: &[Value]) -> Result<Vec<Value>, ScriptError> {
        args.iter().map(|arg| self.expand_value(arg)).collect()
    }

    fn expand_value(&self, value: &Value) -> Result<Value, ScriptError> {
        match value {
            Value::String(s) => match placeholder_body(s) {
                Some(body) => self.expand_placeholder(body),
                None => Ok(value.clone()),
            },
            Value::Array(items) => self.expand(items).map(Value::Array),
            _ => Ok(value.clone()),
        }
    }

    fn expand_placeholder(&self, body: &str) -> Result<Value, ScriptError> {
        if let Some(key) = body.strip_prefix(DEPLOYED_PLACEHOLDER_PREFIX) {
            return self.lookup(key).map(|addr| Value::String(addr.to_string()));
        }

        if let Some(offset) = body.strip_prefix(NOW_PLACEHOLDER) {
            let invalid = || ScriptError::PlanParsing(format!("invalid placeholder `${{{body}}}`"));

            let timestamp = if offset.is_empty() {
                Some(self.now)
            } else if let Some(secs) = offset.strip_prefix('+') {
                secs.trim().parse::<u64>().ok().and_then(|s| self.now.checked_add(s))
            } else if let Some(secs) = offset.strip_prefix('-') {
                secs.trim().parse::<u64>().ok().and_then(|s| self.now.checked_sub(s))
            } else {
                None
            };

            return timestamp.map(Value::from).ok_or_else(invalid);
        }

        Err(ScriptError::PlanParsing(format!("unknown placeholder `${{{body}}}`")))
    }

    fn lookup(&self, key: &str) -> Result<Address, ScriptError> {
        if let Some(address) = self.deployed.get(key) {
            return Ok(*address);
        }

        match &self.deployments_path {
            Some(path) => parse_addr_from_deployments_file(path, key),
            None => Err(ScriptError::PlanParsing(format!(
                "`{key}` was not deployed in this run and no deployments file is configured"
            ))),
        }
    }
}

/// The text between `${` and `}` when `s` is exactly one placeholder
fn placeholder_body(s: &str) -> Option<&str> {
    s.strip_prefix("${")?.strip_suffix('}')
}
