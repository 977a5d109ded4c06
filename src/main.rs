//! Peer failover check.
//!
//! Loads pool configuration, then drives each pool's connection selector over
//! plain TCP and reports which peers ended up up or down.
//!
//! ```text
//! config.toml → PoolManager (one PeerRegistry per pool)
//!             → ConnectionSelector<TcpConnector>
//!             → connect() × attempts
//!             → snapshot printed per pool
//! ```

use clap::Parser;
use std::path::PathBuf;

use peer_failover::config::load_config;
use peer_failover::health::PoolSnapshot;
use peer_failover::observability::{logging, metrics};
use peer_failover::{ConnectionSelector, FailoverError, PoolManager, TcpConnector};

#[derive(Parser, Debug)]
#[command(name = "peer-failover")]
#[command(about = "Check configured peer pools through the failover selector", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "failover.toml")]
    config: PathBuf,

    /// Only check this pool.
    #[arg(short, long)]
    pool: Option<String>,

    /// Connection attempts per pool.
    #[arg(short, long, default_value_t = 1)]
    attempts: u32,

    /// Print snapshots as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        config = %args.config.display(),
        pools = config.pools.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pools = PoolManager::from_config(&config)?;
    let names = match &args.pool {
        Some(name) if config.pools.contains_key(name) => vec![name.clone()],
        Some(name) => return Err(format!("unknown pool '{}'", name).into()),
        None => pools.pool_names(),
    };

    for name in names {
        let (Some(pool_config), Some(registry)) = (config.pools.get(&name), pools.get(&name)) else {
            continue;
        };
        let selector = ConnectionSelector::new(registry, TcpConnector::from_pool_config(pool_config));

        for attempt in 1..=args.attempts {
            match selector.connect().await {
                Ok(stream) => tracing::info!(
                    pool = %name,
                    attempt,
                    remote = ?stream.peer_addr().ok(),
                    "Connected"
                ),
                Err(e @ FailoverError::NoPeersAvailable { .. }) => {
                    tracing::warn!(pool = %name, attempt, error = %e, "Connect failed")
                }
                Err(e) => return Err(e.into()),
            }
        }

        print_snapshot(&selector.registry().snapshot(), args.json)?;
    }

    Ok(())
}

fn print_snapshot(snapshot: &PoolSnapshot, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let up: Vec<&str> = snapshot.up.iter().map(|p| p.as_str()).collect();
    println!("{}: up [{}]", snapshot.pool, up.join(", "));
    for down in &snapshot.down {
        println!("{}: down {} (retry in {}s)", snapshot.pool, down.peer, down.retry_in_secs);
    }
    Ok(())
}
