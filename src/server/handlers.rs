//! Request handlers and wire types.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AppState;
use crate::error::{ExportError, ExtractError, GenerationError};
use crate::export::ExportBundle;
use crate::extract;
use crate::generator::GenerationOutcome;
use crate::question::{ExamDetails, GeneratedQuestion, QuestionConfig, QuestionPaper};

/// Header carrying the original file name on `/extract-text`.
pub const FILE_NAME_HEADER: &str = "x-file-name";

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: examDetails, questionConfig, or extractedTexts";

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate questions. Please try again.";

const DEFAULT_UPLOAD_NAME: &str = "upload.pdf";

/// JSON error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error response with its status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        if err.is_input_error() {
            warn!(error = %err, "Rejected generation request");
            return ApiError::bad_request(err.to_string());
        }
        error!(error = %err, "Error generating questions");
        ApiError::internal(GENERATION_FAILED_MESSAGE)
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Io(e) => {
                error!(error = %e, "Extraction I/O failure");
                ApiError::internal("Failed to read upload")
            }
            other => {
                warn!(error = %other, "Rejected upload");
                ApiError::bad_request(other.to_string())
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoQuestions => ApiError::bad_request(err.to_string()),
            other => {
                error!(error = %other, "Export failed");
                ApiError::internal("Failed to export question paper")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Body of `POST /generate-questions`. Fields are optional so that a
/// missing field yields the dedicated 400 message rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub exam_details: Option<ExamDetails>,
    pub question_config: Option<QuestionConfig>,
    pub extracted_texts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub exam_details: ExamDetails,
    pub questions: Vec<GeneratedQuestion>,
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
    })
}

pub(super) async fn generate_questions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerationOutcome>, ApiError> {
    let request: GenerateRequest = parse_json(&body)?;

    let (Some(exam_details), Some(question_config), Some(extracted_texts)) = (
        request.exam_details,
        request.question_config,
        request.extracted_texts,
    ) else {
        return Err(ApiError::bad_request(MISSING_FIELDS_MESSAGE));
    };

    let outcome = state
        .generator
        .generate_bounded(&exam_details, &question_config, &extracted_texts)
        .await?;

    Ok(Json(outcome))
}

pub(super) async fn extract_text(
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ExtractResponse>, ApiError> {
    let name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_UPLOAD_NAME)
        .to_string();

    let document = tokio::task::spawn_blocking(move || extract::extract_text(&name, &body))
        .await
        .map_err(|e| {
            error!(error = %e, "Text extraction task failed");
            ApiError::internal("Failed to extract text from document")
        })??;

    Ok(Json(ExtractResponse {
        text: document.extracted_text,
    }))
}

pub(super) async fn export(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ExportBundle>, ApiError> {
    let request: ExportRequest = parse_json(&body)?;
    let paper = QuestionPaper::new(request.exam_details, request.questions);
    let bundle = state.exporter.export(&paper)?;
    Ok(Json(bundle))
}
