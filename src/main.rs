//! rampart provider entry point.
//!
//! Reads one resource request (file or stdin), drives it through the
//! handler against the in-memory rule store, and prints the terminal
//! response as JSON. The process exit code mirrors the terminal status.
//!
//! The in-memory backend exists so the full reconcile path (schema gate,
//! normalization, diffing, settlement polling) can be exercised locally;
//! real deployments implement `RuleStore` over their management API and
//! reuse the handler as a library.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rampart::cli::{Cli, Commands};
use rampart::handler;
use rampart::request::ResourceRequest;
use rampart_reconciler::PollConfig;
use rampart_store::{InMemoryRuleStore, TracingRuleStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile {
            request,
            poll_interval,
            poll_ceiling,
            max_retries,
            pending_polls,
        } => {
            let resource_request = read_request(request.as_deref())?;
            info!(
                request_type = ?resource_request.request_type,
                resource_type = %resource_request.resource_type,
                "handling resource request"
            );

            let poll = PollConfig {
                initial_interval: Duration::from_secs(poll_interval),
                max_interval: Duration::from_secs(poll_ceiling),
                max_retries,
            };
            let store = Arc::new(TracingRuleStore::new(InMemoryRuleStore::with_pending_polls(
                pending_polls,
            )));
            let response = handler::handle(&resource_request, store, poll).await;

            println!("{}", response.to_json()?);
            if !response.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn read_request(path: Option<&Path>) -> Result<ResourceRequest> {
    match path {
        Some(path) => ResourceRequest::from_file(path)
            .with_context(|| format!("failed to load request from '{}'", path.display())),
        None => {
            let raw = std::io::read_to_string(std::io::stdin())
                .context("failed to read request from stdin")?;
            ResourceRequest::from_json(&raw).context("failed to parse request from stdin")
        }
    }
}
