//! Elastic IP failover entry point
//!
//! Invoked by an external health monitor (typically a VRRP daemon's
//! `notify_master` hook) when the instance holding a high-availability
//! elastic IP is considered failed.
//!
//! ```bash
//! # explicit peer addresses
//! eip-failover --token $TOKEN --eip 203.0.113.9 --peers 10.0.0.2,10.0.0.3
//!
//! # explicit instance order
//! eip-failover --token $TOKEN --eip 203.0.113.9 --instances 42,43,44
//!
//! # any running instance in the subnet of 10.0.0.1
//! eip-failover --token $TOKEN --eip 203.0.113.9 --subnet-of 10.0.0.1
//! ```
//!
//! Exits 0 on success or idempotent no-op; on failure, logs a single
//! diagnostic line to stderr and exits 1.

use clap::Parser;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eip_failover::{
    CandidatePolicy, ComputeClient, Error, FailoverConfig, FailoverManager, FailoverOutcome,
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS,
};

/// Elastic IP failover between compute instances
#[derive(Parser)]
#[command(name = "eip-failover")]
#[command(about = "Fail a floating elastic IP over to a healthy candidate instance", long_about = None)]
struct Cli {
    /// Compute API token
    #[arg(long, env = "EIP_FAILOVER_TOKEN", hide_env_values = true)]
    token: String,

    /// Public address of the high-availability elastic IP
    #[arg(long)]
    eip: IpAddr,

    /// Ordered candidate instance IDs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    instances: Vec<u64>,

    /// Candidate peer private addresses (comma-separated)
    #[arg(long, value_delimiter = ',')]
    peers: Vec<IpAddr>,

    /// Pick any running instance in the same subnet as this private address
    #[arg(long)]
    subnet_of: Option<IpAddr>,

    /// Compute API endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Overall deadline for the run, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eip_failover=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!(error = %err, "failover aborted");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.token.trim().is_empty() {
        return Err(Error::config("missing required flag: --token").into());
    }

    let policy = CandidatePolicy::from_flags(cli.instances, cli.peers, cli.subnet_of)?;
    let config = FailoverConfig::new(cli.eip, policy)
        .with_timeout(Duration::from_secs(cli.timeout_secs));

    let client = ComputeClient::new(cli.api_url, &cli.token)?;
    let manager = FailoverManager::new(&client, config);

    match manager.run().await? {
        FailoverOutcome::AlreadyAttached { target } => {
            info!(
                instance = %target.instance_name,
                instance_id = target.instance_id,
                "no transition required"
            );
        }
        FailoverOutcome::Completed { target, elapsed } => {
            info!(
                instance = %target.instance_name,
                instance_id = target.instance_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "failover completed"
            );
        }
    }

    Ok(())
}
