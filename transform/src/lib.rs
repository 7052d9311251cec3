//! Source-to-module pipeline for a zero-knowledge virtual machine.
//!
//! [`normalize`] rewrites C-like source into the constrained dialect,
//! [`fingerprint`] classifies source against a closed [`catalog`], and
//! [`generate`] renders a hand-written WebAssembly text module for the result.
//! [`ArtifactOrchestrator`] ties generation to the filesystem and
//! [`handlers`] expose the whole thing through the wire types.

pub mod catalog;
mod codegen;
mod config;
mod fingerprint;
pub mod handlers;
mod normalize;
mod orchestrator;

pub use catalog::AlgorithmFamily;
pub use catalog::UNRECOGNIZED_SENTINEL;
pub use codegen::GeneratedModule;
pub use codegen::generate;
pub use codegen::generate_from_source;
pub use config::ConfigError;
pub use config::ConfigToml;
pub use config::OUTPUT_DIR_ENV_VAR;
pub use config::TransformConfig;
pub use config::ZKCODE_HOME_ENV_VAR;
pub use config::find_zkcode_home;
pub use fingerprint::AlgorithmFingerprint;
pub use fingerprint::fingerprint;
pub use normalize::NormalizedSource;
pub use normalize::Rewrite;
pub use normalize::normalize;
pub use orchestrator::ArtifactOrchestrator;
pub use orchestrator::CompileError;
pub use orchestrator::PersistedArtifact;
