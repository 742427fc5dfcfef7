//! Implementations of the deploy commands

use std::path::PathBuf;

use tracing::warn;

use crate::{
    artifacts::ArtifactStore,
    cli::{DeployArgs, PlanArgs, PresetArgs},
    client::ChainClient,
    errors::ScriptError,
    plan::{DeploymentPlan, Placeholders},
    runner::deploy_contract,
    types::{ContractSpec, DeployOverrides, DeploymentResult},
    utils::{parse_cli_arg, write_deployed_address},
};

/// The state shared by every deployment in a single invocation
pub struct DeploymentSession<C> {
    /// The client submitting deployments
    client: C,
    /// Where contract artifacts are resolved from
    artifacts: ArtifactStore,
    /// Where deployed addresses are recorded, if anywhere
    deployments_path: Option<PathBuf>,
    /// Placeholder values, including addresses deployed so far
    placeholders: Placeholders,
}

impl<C: ChainClient> DeploymentSession<C> {
    /// Create a session deploying through `client`
    pub fn new(client: C, artifacts: ArtifactStore, deployments_path: Option<PathBuf>) -> Self {
        let placeholders = Placeholders::new(deployments_path.clone());
        Self::with_placeholders(client, artifacts, deployments_path, placeholders)
    }

    /// Create a session with explicit placeholder values
    pub fn with_placeholders(
        client: C,
        artifacts: ArtifactStore,
        deployments_path: Option<PathBuf>,
        placeholders: Placeholders,
    ) -> Self {
        Self {
            client,
            artifacts,
            deployments_path,
            placeholders,
        }
    }

    /// The client deployments are submitted through
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deploy a single contract, print its address and record it
    pub async fn deploy(&mut self, spec: &ContractSpec) -> Result<DeploymentResult, ScriptError> {
        let expanded = ContractSpec {
            args: self.placeholders.expand(&spec.args)?,
            ..spec.clone()
        };

        let result = deploy_contract(&self.client, &self.artifacts, &expanded).await?;
        println!("{} deployed at {}", spec.name, result.address);

        if let Some(key) = &spec.key {
            self.placeholders.record(key, result.address);

            if let Some(path) = &self.deployments_path {
                write_deployed_address(path, key, result.address)?;
            }
        } else if self.deployments_path.is_some() {
            warn!("`{}` has no key, not recording it in the deployments file", spec.name);
        }

        Ok(result)
    }
}

/// Deploy a contract described on the command line
pub async fn deploy(
    args: DeployArgs,
    session: &mut DeploymentSession<impl ChainClient>,
) -> Result<(), ScriptError> {
    let spec = ContractSpec {
        name: args.contract,
        args: args.args.iter().map(|a| parse_cli_arg(a)).collect(),
        overrides: DeployOverrides {
            value: args.value,
            gas_limit: args.gas_limit,
        },
        key: args.key,
    };

    session.deploy(&spec).await.map(|_| ())
}

/// Deploy one of the built-in presets
pub async fn deploy_preset(
    args: PresetArgs,
    session: &mut DeploymentSession<impl ChainClient>,
) -> Result<(), ScriptError> {
    session.deploy(&args.preset.spec()).await.map(|_| ())
}

/// Deploy every contract in a plan file, stopping at the first failure
pub async fn run_plan(
    args: PlanArgs,
    session: &mut DeploymentSession<impl ChainClient>,
) -> Result<(), ScriptError> {
    let plan = DeploymentPlan::from_file(&args.file)?;

    for spec in &plan.contracts {
        session.deploy(spec).await?;
    }

    Ok(())
}
