//! Layered configuration for the transform pipeline.
//!
//! Resolution order: built-in defaults, then `$ZKCODE_HOME/config.toml`, then
//! the `ZKCODE_WASM_DIR` environment variable. Callers apply explicit flags
//! on top of the returned value.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_TOML_FILE: &str = "config.toml";
pub const ZKCODE_HOME_ENV_VAR: &str = "ZKCODE_HOME";
pub const OUTPUT_DIR_ENV_VAR: &str = "ZKCODE_WASM_DIR";
pub const DEFAULT_MODULE_EXTENSION: &str = "wat";

/// Directory the downstream VM reads modules from, relative to the home directory.
const SHARED_OUTPUT_SUBDIR: [&str; 3] = ["agentkit", "zkengine", "example_wasms"];
const FALLBACK_OUTPUT_DIR: &str = "example_wasms";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory; set {ZKCODE_HOME_ENV_VAR}")]
    NoHome,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    /// Shared directory artifacts are persisted into.
    pub output_dir: PathBuf,
    /// Extension (without dot) of persisted module files.
    pub module_extension: String,
    /// Parent of the per-compilation scoped workspaces. System temp dir when unset.
    pub workspace_dir: Option<PathBuf>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            workspace_dir: None,
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub output_dir: Option<PathBuf>,
    pub module_extension: Option<String>,
    pub workspace_dir: Option<PathBuf>,
}

impl TransformConfig {
    /// Load using the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let home = find_zkcode_home()?;
        let env_output_dir = std::env::var_os(OUTPUT_DIR_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::load_from(&home, env_output_dir)
    }

    /// Load from an explicit home directory. A missing `config.toml` is not an error.
    pub fn load_from(
        zkcode_home: &Path,
        env_output_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let toml = load_config_toml(zkcode_home)?;
        let mut config = Self::default();
        if let Some(output_dir) = toml.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(extension) = toml.module_extension {
            config.module_extension = extension.trim_start_matches('.').to_string();
        }
        if toml.workspace_dir.is_some() {
            config.workspace_dir = toml.workspace_dir;
        }
        if let Some(output_dir) = env_output_dir {
            debug!(path = %output_dir.display(), "output directory overridden from environment");
            config.output_dir = output_dir;
        }
        Ok(config)
    }
}

fn load_config_toml(zkcode_home: &Path) -> Result<ConfigToml, ConfigError> {
    let path = zkcode_home.join(CONFIG_TOML_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(ConfigToml::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// `$ZKCODE_HOME` if set and non-empty, otherwise `~/.zkcode`.
pub fn find_zkcode_home() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(ZKCODE_HOME_ENV_VAR)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }
    let mut home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    home.push(".zkcode");
    Ok(home)
}

fn default_output_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => SHARED_OUTPUT_SUBDIR
            .iter()
            .fold(home, |path, part| path.join(part)),
        None => PathBuf::from(FALLBACK_OUTPUT_DIR),
    }
}
