use std::io::Read;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use zkcode_protocol::Request;
use zkcode_transform::ArtifactOrchestrator;
use zkcode_transform::handlers::handle_request_async;

use crate::load_config;

/// Answer one JSON request read from stdin.
///
/// Accepts `{"normalize": {...}}` or `{"compile": {...}}` and writes the
/// response to stdout. Pipeline failures are reported in the response body,
/// not through the exit status.
#[derive(Debug, Parser)]
pub struct RequestCommand {}

pub async fn run(_cmd: RequestCommand) -> Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read request from stdin")?;
    let request: Request = serde_json::from_str(&raw).context("malformed request")?;

    let config = load_config(None)?;
    let orchestrator = ArtifactOrchestrator::new(&config);
    let response = handle_request_async(&orchestrator, request).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
