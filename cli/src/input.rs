use std::io::Read;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

/// Read source from `path`, or from stdin when `path` is absent or `-`.
pub(crate) fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read source from stdin")?;
            Ok(source)
        }
    }
}
