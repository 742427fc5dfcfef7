//! Constants used in the deploy scripts

use std::time::Duration;

/// The RPC URL used when none is configured, a local development node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The directory searched for compilation artifacts when none is configured
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The number of confirmations to wait for the contract deployment transaction.
///
/// A deployment is never reported before its transaction is mined, so this
/// is also the minimum.
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// How often to poll for the receipt of a deployment transaction
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The extension of a contract artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The directory holding full compiler inputs/outputs, which never contains
/// per-contract artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The prefix of an unlinked library placeholder in creation bytecode
pub const LINK_PLACEHOLDER_PREFIX: &str = "__$";

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The placeholder prefix for an address recorded by an earlier deployment
pub const DEPLOYED_PLACEHOLDER_PREFIX: &str = "deployed:";

/// The placeholder for the current unix timestamp, in seconds
pub const NOW_PLACEHOLDER: &str = "now";

/// The name of the marketplace contract
pub const MARKETPLACE_CONTRACT_NAME: &str = "RES_Marketplace";

/// The name of the RES token contract
pub const RES_TOKEN_CONTRACT_NAME: &str = "RES_TOKEN";

/// The name of the time lock contract
pub const LOCK_CONTRACT_NAME: &str = "Lock";

/// How far in the future the `Lock` preset sets its unlock time, in seconds
pub const LOCK_UNLOCK_DELAY_SECS: u64 = 60;

/// The value locked by the `Lock` preset
pub const LOCK_VALUE: &str = "1 gwei";
