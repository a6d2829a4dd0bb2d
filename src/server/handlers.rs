use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::AppState;
use crate::error::ToolError;
use crate::export;
use crate::model::{ReconciledItem, RoundKey, RoundStatistic};
use crate::reconcile::SaveItem;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Machine readable error category sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    InvalidRequest,
    CatalogUnavailable,
    StoreUnavailable,
    Internal,
}

/// Error returned by request handlers, rendered as `{"error": {...}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: ApiErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        let (status, code) = match &err {
            ToolError::InvalidRequest(_) | ToolError::Upload(_) => {
                (StatusCode::BAD_REQUEST, ApiErrorCode::InvalidRequest)
            }
            ToolError::CatalogUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::CatalogUnavailable)
            }
            ToolError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::StoreUnavailable)
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::Internal),
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            warn!(error = %err, "request rejected");
        }
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ToolError::InvalidRequest(rejection.body_text()).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ToolError::InvalidRequest(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

/// Runs blocking tracker work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::internal(format!("worker task failed: {err}")))?
        .map_err(ApiError::from)
}

#[derive(Debug, Deserialize)]
pub(super) struct RoundQuery {
    year: String,
    round_name: String,
}

impl RoundQuery {
    fn into_key(self) -> Result<RoundKey, ApiError> {
        let (year, round_name) = (self.year.trim(), self.round_name.trim());
        if year.is_empty() || round_name.is_empty() {
            return Err(ToolError::InvalidRequest(
                "'year' and 'round_name' must not be empty".into(),
            )
            .into());
        }
        Ok(RoundKey::new(year, round_name))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    year: Option<String>,
    round_name: Option<String>,
}

impl ExportQuery {
    /// Both parameters select one round; neither selects every round.
    fn into_filter(self) -> Result<Option<RoundKey>, ApiError> {
        match (self.year, self.round_name) {
            (Some(year), Some(round_name)) => RoundQuery { year, round_name }.into_key().map(Some),
            (None, None) => Ok(None),
            _ => Err(ToolError::InvalidRequest(
                "'year' and 'round_name' must be given together".into(),
            )
            .into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SaveItemRequest {
    year: String,
    round_name: String,
    id: String,
    description: String,
    evidence_name: String,
}

impl From<SaveItemRequest> for SaveItem {
    fn from(request: SaveItemRequest) -> Self {
        SaveItem {
            round: RoundKey::new(request.year, request.round_name),
            item_id: request.id,
            description: request.description,
            evidence_name: request.evidence_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SaveItemResponse {
    message: &'static str,
}

pub(super) async fn healthz_handler() -> &'static str {
    "ok"
}

pub(super) async fn items_handler(
    State(state): State<AppState>,
    query: Result<Query<RoundQuery>, QueryRejection>,
) -> Result<Json<Vec<ReconciledItem>>, ApiError> {
    let Query(query) = query?;
    let round = query.into_key()?;
    let tracker = state.tracker.clone();
    let items = run_blocking(move || tracker.list(&round)).await?;
    Ok(Json(items))
}

pub(super) async fn save_item_handler(
    State(state): State<AppState>,
    body: Result<Json<SaveItemRequest>, JsonRejection>,
) -> Result<Json<SaveItemResponse>, ApiError> {
    let Json(request) = body?;
    let request = SaveItem::from(request);
    let tracker = state.tracker.clone();
    run_blocking(move || tracker.save(&request)).await?;
    Ok(Json(SaveItemResponse { message: "Success" }))
}

pub(super) async fn statistics_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundStatistic>>, ApiError> {
    let tracker = state.tracker.clone();
    let stats = run_blocking(move || tracker.statistics()).await?;
    Ok(Json(stats))
}

pub(super) async fn export_pdf_handler(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let round = query.into_filter()?;
    let file_name = export::report_file_name(round.as_ref(), "pdf");
    let tracker = state.tracker.clone();
    let font_path = state.font_path.clone();
    let bytes = run_blocking(move || {
        export::pdf_report(&tracker, round.as_ref(), font_path.as_deref())
    })
    .await?;
    Ok(attachment(bytes, PDF_CONTENT_TYPE, &file_name))
}

pub(super) async fn export_xlsx_handler(
    State(state): State<AppState>,
    query: Result<Query<RoundQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let round = query.into_key()?;
    let file_name = export::report_file_name(Some(&round), "xlsx");
    let tracker = state.tracker.clone();
    let bytes = run_blocking(move || export::xlsx_report(&tracker, &round)).await?;
    Ok(attachment(bytes, XLSX_CONTENT_TYPE, &file_name))
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    (StatusCode::OK, headers, bytes).into_response()
}

/// `attachment` disposition with an ASCII fallback name and the UTF-8 name
/// percent-encoded per RFC 5987.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::content_disposition;

    #[test]
    fn content_disposition_encodes_hangul_round_names() {
        let value = content_disposition("ISMS_Report_2025_최초.pdf");
        assert!(value.starts_with("attachment; filename=\"ISMS_Report_2025_"));
        assert!(value.contains("filename*=UTF-8''ISMS_Report_2025_%EC%B5%9C%EC%B4%88.pdf"));
        assert!(value.is_ascii());
    }
}
