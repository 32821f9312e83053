//! Operator CLI for inspecting host selection against a cluster description.
//!
//! ```text
//! cluster-balancer --config client.toml plan --count 5
//! cluster-balancer -p 10.0.0.1 -p 10.0.0.2 probe
//! cluster-balancer --config client.toml watch
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use cluster_balancer::config::{apply_reload, ConfigSource, ConfigWatcher};
use cluster_balancer::load_balancer::build_policy;
use cluster_balancer::net::ConnectError;
use cluster_balancer::{
    observability, Connector, Error, LoadBalancingPolicy, Metadata, QueryContext, SocketOptions,
};

#[derive(Parser)]
#[command(name = "cluster-balancer")]
#[command(about = "Inspect query plans and connection tuning for a cluster", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra contact point (ip[:port]); may be repeated.
    #[arg(short = 'p', long = "contact-point")]
    contact_points: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print query plans as JSON lines
    Plan {
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Connect to every host of one plan with the configured socket options
    Probe,
    /// Reload the config file on change and print a plan after each reload
    Watch,
}

#[tokio::main]
async fn main() -> cluster_balancer::Result<()> {
    let cli = Cli::parse();

    let source = ConfigSource::new(cli.config).with_contact_points(cli.contact_points);
    let mut config = source.load()?;
    observability::init(&config.observability)?;

    let registry = Arc::new(Metadata::from_hosts(config.contact_hosts()));
    let policy = build_policy(&config.policy);
    policy.initialize(registry.clone());

    tracing::info!(
        hosts = registry.len(),
        policy = ?config.policy.kind,
        "Cluster view ready"
    );

    match cli.command {
        Commands::Plan { count } => {
            for i in 0..count {
                print_plan(i, policy.as_ref());
            }
        }
        Commands::Probe => {
            let connector = Connector::new(Arc::new(SocketOptions::from(&config.socket)));
            probe(&connector, policy.as_ref()).await;
        }
        Commands::Watch => {
            if source.path().is_none() {
                return Err(Error::Usage("watch requires --config"));
            }
            let (watcher, mut updates) = ConfigWatcher::new(source);
            let _watcher = watcher.run()?;

            print_plan(0, policy.as_ref());
            let mut reloads = 0;
            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => {
                        reloads += 1;
                        apply_reload(&config, &new_config, &registry);
                        config.contact_points = new_config.contact_points;
                        print_plan(reloads, policy.as_ref());
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, exiting");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_plan(index: usize, policy: &dyn LoadBalancingPolicy) {
    let hosts: Vec<_> = policy
        .new_query_plan(&QueryContext::new())
        .map(|host| {
            json!({
                "address": host.addr().to_string(),
                "datacenter": host.datacenter(),
                "distance": policy.distance(&host),
            })
        })
        .collect();
    println!("{}", json!({ "plan": index, "hosts": hosts }));
}

async fn probe(connector: &Connector, policy: &dyn LoadBalancingPolicy) {
    for host in policy.new_query_plan(&QueryContext::new()) {
        let outcome = match connector.connect_host(&host).await {
            Ok(_) => json!({ "ok": true }),
            Err(e) => json!({
                "ok": false,
                "connected": matches!(e, ConnectError::KeepAlive { .. }),
                "error": e.to_string(),
            }),
        };
        println!(
            "{}",
            json!({ "address": host.addr().to_string(), "outcome": outcome })
        );
    }
}
