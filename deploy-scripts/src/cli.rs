//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    client::ChainClient,
    commands::{deploy, deploy_preset, run_plan, DeploymentSession},
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_RPC_URL, NUM_DEPLOY_CONFIRMATIONS},
    errors::ScriptError,
    types::Preset,
};

/// Deploy compiled contracts to an EVM chain
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Path to the `deployments.json` file in which to record deployed addresses
    #[arg(short, long)]
    pub deployments_path: Option<PathBuf>,

    /// Number of confirmations to wait for each deployment, at least 1
    #[arg(short, long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Give up waiting for a deployment to be confirmed after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deploy commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a single contract described by flags
    Deploy(DeployArgs),
    /// Deploy one of the built-in contracts
    Preset(PresetArgs),
    /// Deploy the contracts listed in a plan file
    Plan(PlanArgs),
}

impl Command {
    /// Run the command, deploying through the given session
    pub async fn run(
        self,
        session: &mut DeploymentSession<impl ChainClient>,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, session).await,
            Command::Preset(args) => deploy_preset(args, session).await,
            Command::Plan(args) => run_plan(args, session).await,
        }
    }
}

/// Deploy a single contract
#[derive(Args)]
pub struct DeployArgs {
    /// Name of the contract, or `path/to/Source.sol:Name` if ambiguous
    #[arg(long)]
    pub contract: String,

    /// Constructor argument, in order; may be repeated.
    ///
    /// JSON values (numbers, booleans, arrays) are taken as such, anything
    /// else as a string. `${now+N}` and `${deployed:KEY}` are expanded.
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Value to attach, in wei or with a unit, e.g. `1 gwei`
    #[arg(long)]
    pub value: Option<String>,

    /// Gas limit for the deployment transaction
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Key under which to record the address in the deployments file
    #[arg(long)]
    pub key: Option<String>,
}

/// Deploy a built-in contract
#[derive(Args)]
pub struct PresetArgs {
    /// The preset to deploy
    #[arg(value_enum)]
    pub preset: Preset,
}

/// Deploy a plan file
#[derive(Args)]
pub struct PlanArgs {
    /// Path to the JSON plan
    #[arg(short, long)]
    pub file: PathBuf,
}
