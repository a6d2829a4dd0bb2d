use std::path::Path;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use super::handlers::ApiError;
use crate::error::ToolError;

/// Item suggested for every upload until evidence analysis exists.
pub const PLACEHOLDER_RECOMMENDATION: &str = "1.1.1";

#[derive(Debug, Serialize)]
pub(super) struct StoredEvidence {
    filename: String,
    stored_as: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeEvidenceResponse {
    files: Vec<StoredEvidence>,
    recommended_id: &'static str,
}

/// Stores every uploaded file and answers with a placeholder item id.
/// Form fields without a file name are ignored.
pub(super) async fn analyze_evidence_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeEvidenceResponse>, ApiError> {
    let mut multipart = multipart.map_err(|err| ToolError::Upload(err.body_text()))?;
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ToolError::Upload(err.to_string()))?
    {
        let Some(original) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|err| ToolError::Upload(err.to_string()))?;

        let stored_as = stored_file_name(&original);
        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(ToolError::from)?;
        tokio::fs::write(state.upload_dir.join(&stored_as), &data)
            .await
            .map_err(ToolError::from)?;
        info!(
            filename = %original,
            stored_as = %stored_as,
            byte_count = data.len(),
            "evidence stored"
        );
        files.push(StoredEvidence {
            filename: original,
            stored_as,
        });
    }

    if files.is_empty() {
        return Err(ToolError::Upload("no file part in upload".into()).into());
    }
    Ok(Json(AnalyzeEvidenceResponse {
        files,
        recommended_id: PLACEHOLDER_RECOMMENDATION,
    }))
}

/// Unique on-disk name for an upload. Directory components supplied by the
/// client are dropped.
fn stored_file_name(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("evidence");
    format!("{}_{base}", Uuid::new_v4().simple())
}
