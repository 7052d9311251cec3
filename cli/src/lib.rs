pub mod compile_cmd;
pub mod fingerprint_cmd;
mod input;
pub mod normalize_cmd;
pub mod request_cmd;

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use zkcode_transform::TransformConfig;

/// Resolve configuration and apply an explicit output directory on top.
pub(crate) fn load_config(out_dir: Option<PathBuf>) -> Result<TransformConfig> {
    let mut config = TransformConfig::load().context("failed to load configuration")?;
    if let Some(out_dir) = out_dir {
        config.output_dir = out_dir;
    }
    Ok(config)
}
