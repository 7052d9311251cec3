use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use zkcode_protocol::NormalizeRequest;
use zkcode_transform::handlers::handle_normalize;

use crate::input::read_source;

/// Rewrite C-like source into the constrained dialect.
#[derive(Debug, Parser)]
pub struct NormalizeCommand {
    /// Source file; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    /// Echo the source back without applying any rewrite.
    #[arg(long = "no-auto-transform", default_value_t = false)]
    no_auto_transform: bool,
    /// Print a JSON response instead of the rewritten source.
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

pub fn run(cmd: NormalizeCommand) -> Result<()> {
    let code = read_source(cmd.file.as_deref())?;
    let response = handle_normalize(NormalizeRequest {
        code,
        auto_transform: !cmd.no_auto_transform,
    });

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    for change in &response.changes {
        eprintln!("- {change}");
    }
    print!("{}", response.transformed_code);
    Ok(())
}
