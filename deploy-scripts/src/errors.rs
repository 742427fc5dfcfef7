//! Definitions of errors that can occur during contract deployment

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur while deploying a contract.
///
/// Every variant is a deployment failure; the variant only narrows down
/// the diagnostic message.
#[derive(Debug)]
pub enum ScriptError {
    /// No artifact exists for the requested contract name
    ArtifactNotFound(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// Error reading or parsing a deployment plan
    PlanParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing the deployment calldata
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ArtifactNotFound(s) => write!(f, "artifact not found: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::PlanParsing(s) => write!(f, "error parsing deployment plan: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
