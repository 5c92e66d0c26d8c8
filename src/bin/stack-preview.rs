// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Preview
//!
//! Builds the quickstart graph from environment configuration and resolves
//! it against the in-memory provider, printing the outputs as JSON.
//!
//! Run with: cargo run --bin stack-preview [-- --dot | --records]
//!
//! Environment:
//! - `STACK_VARIANT` - `full` (default) or `minimal`
//! - `STACK_REGION` - region, zones follow (default: ap-southeast-2)
//! - `STACK_VPC_CIDR` - VPC range (default: 10.0.0.0/16)
//! - `STACK_INSTANCE_TYPE` - instance type for the full variant
//! - `STACK_ACCOUNT` - account shown in generated ARNs
//! - `RUST_LOG` - tracing filter

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use cim_stack_graph::provider::memory::DEFAULT_ACCOUNT;
use cim_stack_graph::{build_stack, Engine, InMemoryProvider, MachineImage, StackConfig};
use clap::Parser;
use tracing::info;

/// Preview the declaration graph of the quickstart stack
#[derive(Parser, Debug)]
#[command(name = "stack-preview")]
#[command(about = "Build the quickstart stack graph and preview it")]
#[command(version)]
struct Cli {
    /// Print the dependency graph in Graphviz DOT format
    #[arg(long, conflicts_with = "records")]
    dot: bool,

    /// Print the declaration records as JSON
    #[arg(long)]
    records: bool,

    /// Account embedded in generated ARNs
    #[arg(long, env = "STACK_ACCOUNT", default_value = DEFAULT_ACCOUNT)]
    account: String,
}

/// Catalog answering the default image query
fn sample_provider(region: &str, account: &str) -> Result<InMemoryProvider> {
    let mut provider = InMemoryProvider::new(region).with_account(account);
    let images = [
        ("ami-0a1b2c3d4e5f60001", "amzn2-ami-hvm-2.0.20240306.2-x86_64-ebs", 2024, 3, 6),
        ("ami-0a1b2c3d4e5f60002", "amzn2-ami-hvm-2.0.20240412.0-x86_64-ebs", 2024, 4, 12),
        ("ami-0a1b2c3d4e5f60003", "amzn2-ami-hvm-2.0.20240412.0-arm64-gp2", 2024, 4, 12),
    ];
    for (id, name, year, month, day) in images {
        let created = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .context("invalid image creation date")?;
        provider = provider.with_image(MachineImage::new(id, name, "amazon", created));
    }
    Ok(provider)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = StackConfig::from_env().context("Failed to load stack configuration")?;
    info!(
        project = %config.project,
        region = %config.region,
        variant = ?config.variant(),
        "Configuration loaded"
    );

    let graph = build_stack(&config).context("Failed to build stack graph")?;

    if cli.dot {
        println!("{}", graph.to_dot());
    } else if cli.records {
        let records = serde_json::to_string_pretty(graph.records())
            .context("Failed to serialize declaration records")?;
        println!("{}", records);
    } else {
        let engine = Engine::new(sample_provider(&config.region, &cli.account)?);
        let evaluation = engine
            .evaluate(&graph)
            .await
            .context("Failed to evaluate stack")?;

        let outputs = serde_json::to_string_pretty(&evaluation.outputs)
            .context("Failed to serialize outputs")?;
        println!("{}", outputs);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_modes() {
        let cli = Cli::try_parse_from(["stack-preview", "--dot"]).unwrap();
        assert!(cli.dot && !cli.records);

        let cli = Cli::try_parse_from(["stack-preview", "--account", "210987654321"]).unwrap();
        assert!(!cli.dot && !cli.records);
        assert_eq!(cli.account, "210987654321");

        assert!(Cli::try_parse_from(["stack-preview", "--dot", "--records"]).is_err());
        assert!(Cli::try_parse_from(["stack-preview", "--json"]).is_err());
    }
}
