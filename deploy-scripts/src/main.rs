use std::time::Duration;

use clap::Parser;
use deploy_scripts::{
    artifacts::ArtifactStore, cli::Cli, client::setup_client, commands::DeploymentSession,
    errors::ScriptError,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        artifacts,
        deployments_path,
        confirmations,
        timeout_secs,
        command,
    } = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // `--help` and `--version` are reported as errors by clap but are not failures
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    // Logs go to stderr, stdout only carries deployed addresses
    tracing_subscriber::fmt()
        .pretty()
        .with_writer(std::io::stderr)
        .init();

    let timeout = timeout_secs.map(Duration::from_secs);
    let client = setup_client(&priv_key, &rpc_url, confirmations, timeout).await?;
    let mut session = DeploymentSession::new(client, ArtifactStore::new(artifacts), deployments_path);

    command.run(&mut session).await
}
