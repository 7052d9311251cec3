//! Wire types exchanged with the transform service.
//!
//! These mirror the request/response bodies of the normalize and compile
//! endpoints. Optional response fields serialize as `null` rather than being
//! omitted so existing clients keep seeing every key.

use serde::Deserialize;
use serde::Serialize;

/// Request to rewrite source into the constrained dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeRequest {
    pub code: String,
    #[serde(default = "default_auto_transform")]
    pub auto_transform: bool,
}

fn default_auto_transform() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub success: bool,
    pub transformed_code: String,
    pub changes: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request to fingerprint source and persist the generated module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub code: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    /// Full text of the generated module.
    #[serde(default)]
    pub wat_content: Option<String>,
    /// Name of the persisted artifact inside the shared output directory.
    #[serde(default)]
    pub wasm_file: Option<String>,
    /// Byte length of `wat_content`.
    #[serde(default)]
    pub wasm_size: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CompileResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            wat_content: None,
            wasm_file: None,
            wasm_size: None,
            error: Some(error.into()),
        }
    }
}

/// A single request read from a line-oriented or stdin transport.
///
/// Externally tagged: `{"normalize": {...}}` or `{"compile": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    Normalize(NormalizeRequest),
    Compile(CompileRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Normalize(NormalizeResponse),
    Compile(CompileResponse),
}
