use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use zkcode_protocol::CompileRequest;
use zkcode_transform::ArtifactOrchestrator;
use zkcode_transform::handlers::handle_compile_async;
use zkcode_transform::normalize;

use crate::input::read_source;
use crate::load_config;

/// Generate a module for the source and persist it to the output directory.
#[derive(Debug, Parser)]
pub struct CompileCommand {
    /// Source file; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    /// Artifact base name; a trailing `.c` is dropped.
    #[arg(long = "name", value_name = "NAME")]
    name: String,
    /// Output directory (overrides config and ZKCODE_WASM_DIR).
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Normalize the source before compiling it.
    #[arg(long = "normalize", default_value_t = false)]
    normalize: bool,
    /// Print a JSON response instead of the artifact path.
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

pub async fn run(cmd: CompileCommand) -> Result<()> {
    let mut code = read_source(cmd.file.as_deref())?;
    if cmd.normalize {
        code = normalize(&code).text;
    }
    let config = load_config(cmd.out_dir)?;
    let orchestrator = ArtifactOrchestrator::new(&config);

    if cmd.json {
        let response = handle_compile_async(
            &orchestrator,
            CompileRequest {
                code,
                filename: cmd.name,
            },
        )
        .await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return match response.error {
            Some(error) if !response.success => Err(anyhow!(error)),
            _ => Ok(()),
        };
    }

    let artifact = orchestrator
        .compile_async(code, cmd.name)
        .await
        .context("compile failed")?;
    println!("{}", artifact.path().display());
    Ok(())
}
