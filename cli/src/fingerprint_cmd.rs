use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use zkcode_transform::AlgorithmFingerprint;
use zkcode_transform::UNRECOGNIZED_SENTINEL;
use zkcode_transform::fingerprint;
use zkcode_transform::normalize;

use crate::input::read_source;

/// Show which algorithm family the source matches and the operands found.
#[derive(Debug, Parser)]
pub struct FingerprintCommand {
    /// Source file; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    /// Normalize the source before fingerprinting it.
    #[arg(long = "normalize", default_value_t = false)]
    normalize: bool,
    /// Print the fingerprint as JSON.
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

pub fn run(cmd: FingerprintCommand) -> Result<()> {
    let mut code = read_source(cmd.file.as_deref())?;
    if cmd.normalize {
        code = normalize(&code).text;
    }
    let fp = fingerprint(&code);
    if cmd.json {
        println!("{}", serde_json::to_string(&fp)?);
    } else {
        println!("{}", describe(fp));
    }
    Ok(())
}

fn describe(fp: AlgorithmFingerprint) -> String {
    match fp {
        AlgorithmFingerprint::PrimalityCheck { n } => format!("primality_check n={n}"),
        AlgorithmFingerprint::CollatzSteps { n } => format!("collatz_steps n={n}"),
        AlgorithmFingerprint::DigitalRoot { n } => format!("digital_root n={n}"),
        AlgorithmFingerprint::Fibonacci { n } => format!("fibonacci n={n}"),
        AlgorithmFingerprint::Factorial { n } => format!("factorial n={n}"),
        AlgorithmFingerprint::Gcd { a, b } => format!("gcd a={a} b={b}"),
        AlgorithmFingerprint::Unrecognized => {
            format!("unrecognized (module returns {UNRECOGNIZED_SENTINEL})")
        }
    }
}
