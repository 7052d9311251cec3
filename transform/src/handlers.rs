//! Maps pipeline results onto the wire types. Handlers never fail: every
//! error becomes a `success: false` response carrying its description.

use tracing::warn;
use zkcode_protocol::CompileRequest;
use zkcode_protocol::CompileResponse;
use zkcode_protocol::NormalizeRequest;
use zkcode_protocol::NormalizeResponse;
use zkcode_protocol::Request;
use zkcode_protocol::Response;

use crate::normalize::normalize;
use crate::orchestrator::ArtifactOrchestrator;
use crate::orchestrator::CompileError;
use crate::orchestrator::PersistedArtifact;

pub const NO_TRANSFORM_NOTE: &str = "No transformation applied (auto_transform=False)";

pub fn handle_normalize(request: NormalizeRequest) -> NormalizeResponse {
    if !request.auto_transform {
        return NormalizeResponse {
            success: true,
            transformed_code: request.code,
            changes: vec![NO_TRANSFORM_NOTE.to_string()],
            error: None,
        };
    }
    let normalized = normalize(&request.code);
    NormalizeResponse {
        success: true,
        changes: normalized.change_descriptions(),
        transformed_code: normalized.text,
        error: None,
    }
}

pub fn handle_compile(
    orchestrator: &ArtifactOrchestrator,
    request: CompileRequest,
) -> CompileResponse {
    compile_response(orchestrator.compile(&request.code, &request.filename))
}

pub async fn handle_compile_async(
    orchestrator: &ArtifactOrchestrator,
    request: CompileRequest,
) -> CompileResponse {
    compile_response(
        orchestrator
            .compile_async(request.code, request.filename)
            .await,
    )
}

/// Dispatch one wire request. Compiles run on the blocking pool.
pub async fn handle_request_async(
    orchestrator: &ArtifactOrchestrator,
    request: Request,
) -> Response {
    match request {
        Request::Normalize(request) => Response::Normalize(handle_normalize(request)),
        Request::Compile(request) => {
            Response::Compile(handle_compile_async(orchestrator, request).await)
        }
    }
}

fn compile_response(result: Result<PersistedArtifact, CompileError>) -> CompileResponse {
    match result {
        Ok(artifact) => CompileResponse {
            success: true,
            wasm_size: Some(artifact.module.size as u64),
            wat_content: Some(artifact.module.text),
            wasm_file: Some(artifact.file_name),
            error: None,
        },
        Err(err) => {
            warn!(error = %err, "compile failed");
            CompileResponse::failure(err.to_string())
        }
    }
}
