use super::error::ApiError;
use super::form::UploadForm;
use super::AppState;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::Instrument;
use uuid::Uuid;
use zeorun_analysis::{staged_input_name, Operation, OperationKind};
use zeorun_runner::{CacheStatSnapshot, ProcessExecutor};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn cache_stats<E: ProcessExecutor>(
    State(state): State<AppState<E>>,
) -> Json<CacheStatSnapshot> {
    Json(state.runner.cache_stats())
}

/// `POST /api/:operation` with a multipart structure upload
pub async fn run_operation<E: ProcessExecutor>(
    State(state): State<AppState<E>>,
    Path(operation): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id, operation = %operation);
    handle(state, operation, multipart).instrument(span).await
}

async fn handle<E: ProcessExecutor>(
    state: AppState<E>,
    operation: String,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let kind: OperationKind = operation
        .parse()
        .map_err(|_| ApiError::NotFound(format!("unknown operation '{operation}'")))?;

    let form = UploadForm::read(multipart).await?;
    let op = Operation::from_params(kind, &form.params()?)?;
    let staged = staged_input_name(&form.file_name)?;

    let response = state
        .runner
        .run_operation(&op, form.structure, &staged)
        .await?;

    if !response.success() {
        return Err(ApiError::ToolFailed {
            reason: response
                .result
                .failure
                .as_ref()
                .map(|f| f.label())
                .unwrap_or("unknown"),
            stderr: response.stderr().to_string(),
        });
    }

    let report = op.decode(&response.result)?;
    let mut body =
        serde_json::to_value(&report).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Value::Object(fields) = &mut body {
        fields.insert("cached".to_string(), Value::Bool(response.cached()));
    }

    tracing::info!(
        upload = %form.file_name,
        status = ?response.status,
        "request served"
    );
    Ok(Json(body))
}
