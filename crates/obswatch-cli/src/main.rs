//! obswatch - trigger an OBS service remote run and wait for the rebuild.
//!
//! Reads its configuration from flags or the `OBS_*` environment
//! variables, triggers `cmd=runservice` for the package, then polls the
//! project summary until every repository is published (exit 0) or a
//! package fails (exit 1).

use anyhow::Result;
use clap::Parser;
use obswatch_core::{init_tracing, BuildState, ObsClient, ObsConfig, DEFAULT_API_URL};
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "obswatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trigger an OBS service remote run and watch the rebuild", long_about = None)]
struct Cli {
    /// Build-service account name
    #[arg(long, env = "OBS_USER")]
    username: String,

    /// Build-service account password
    #[arg(long, env = "OBS_PASS", hide_env_values = true)]
    password: String,

    /// Project to trigger and watch (e.g. home:user:misc)
    #[arg(long, env = "OBS_PROJECT")]
    project: String,

    /// Package whose source services are re-run
    #[arg(long, env = "OBS_PKG")]
    package: String,

    /// API endpoint of the build service
    #[arg(long, env = "OBS_APIURL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Git repository to write into the package _service definition
    /// before triggering the remote run
    #[arg(long, env = "OBS_SOURCE_URL")]
    source_url: Option<String>,

    /// Branch or revision for --source-url
    #[arg(long, env = "OBS_SOURCE_BRANCH", default_value = "master", requires = "source_url")]
    source_branch: String,

    /// Seconds between status polls
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines and print the final status as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing configuration exits 1, same as any other failure; clap
    // would exit 2 on its own.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().ok();
            std::process::exit(1);
        }
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = ObsConfig::new(&cli.username, &cli.password, &cli.project)
        .with_api_url(&cli.api_url);
    let client = ObsClient::new(config)?;

    if let Some(source_url) = &cli.source_url {
        info!(
            url = %source_url,
            branch = %cli.source_branch,
            "updating _service definition"
        );
        client
            .upload_service(&cli.package, source_url, &cli.source_branch)
            .await?;
    }

    info!(
        project = %cli.project,
        package = %cli.package,
        "invoking service remote run"
    );
    client.service_remoterun(&cli.package).await?;

    let status = client
        .wait_for_publish(Duration::from_secs(cli.poll_interval))
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    match status.state {
        BuildState::Ok => {
            info!("build for remote run finished");
            Ok(())
        }
        _ => anyhow::bail!("build failed: {}", status.reason),
    }
}
