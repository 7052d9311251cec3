use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;
use zkcode_cli::compile_cmd;
use zkcode_cli::compile_cmd::CompileCommand;
use zkcode_cli::fingerprint_cmd;
use zkcode_cli::fingerprint_cmd::FingerprintCommand;
use zkcode_cli::normalize_cmd;
use zkcode_cli::normalize_cmd::NormalizeCommand;
use zkcode_cli::request_cmd;
use zkcode_cli::request_cmd::RequestCommand;

/// Normalize C-like programs and compile them into zkVM-ready modules.
///
/// Logs go to stderr; set RUST_LOG to adjust verbosity.
#[derive(Debug, Parser)]
#[command(name = "zkcode", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite source into the constrained dialect.
    Normalize(NormalizeCommand),
    /// Show the detected algorithm family and operands.
    Fingerprint(FingerprintCommand),
    /// Generate and persist a module.
    Compile(CompileCommand),
    /// Answer one JSON request from stdin.
    Request(RequestCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Command::Normalize(cmd) => normalize_cmd::run(cmd),
        Command::Fingerprint(cmd) => fingerprint_cmd::run(cmd),
        Command::Compile(cmd) => compile_cmd::run(cmd).await,
        Command::Request(cmd) => request_cmd::run(cmd).await,
    }
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
