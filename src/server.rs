//! HTTP frontend for the segmentation engine.
//!
//! - POST /procesar - Upload a composite PDF (multipart field `pdf`)
//! - GET /descargar/{result_id}/{filename} - Download one course PDF
//! - GET /descargar-todo/{result_id} - Download every course as a ZIP
//! - GET /health - Liveness and version

use crate::error::SyllabusSplitterError;
use crate::services::{ArchiveBuilder, PdfDocument, ResultStore, SegmentationEngine};
use crate::types::{
    ManifestEntry, ProcessingResult, SegmentFailure, ServiceConfig, DEFAULT_OUTPUT_FOLDER, MARKER,
};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultStore>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub result_id: String,
    pub courses: Vec<ManifestEntry>,
    pub total_pages: usize,
    pub message: String,
    pub failures: Vec<SegmentFailure>,
}

/// Error body `{"error": "..."}` with its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Error interno al procesar el PDF".to_string(),
        }
    }
}

impl From<SyllabusSplitterError> for ApiError {
    fn from(err: SyllabusSplitterError) -> Self {
        match err {
            SyllabusSplitterError::UnreadableInput { reason } => {
                Self::bad_request(format!("Error al procesar el PDF: {}", reason))
            }
            SyllabusSplitterError::UnknownResult { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: "Resultado no encontrado".to_string(),
            },
            SyllabusSplitterError::UnknownFile { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: "Archivo no encontrado".to_string(),
            },
            other => {
                error!("Internal error: {}", other);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState, config: &ServiceConfig) -> Router {
    Router::new()
        .route("/procesar", post(process_upload))
        .route("/descargar/{result_id}/{filename}", get(download_file))
        .route("/descargar-todo/{result_id}", get(download_all))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

pub async fn serve(state: AppState, config: ServiceConfig) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state, &config)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

async fn process_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulario inválido: {}", e)))?
    {
        if field.name() != Some("pdf") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("No se pudo leer el archivo: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("No se envió ningún archivo"))?;
    let response = process_pdf_upload(state, filename, bytes).await?;
    Ok(Json(response))
}

/// Validates an uploaded file, runs the engine off the async runtime and
/// stores the produced PDFs.
pub async fn process_pdf_upload(
    state: AppState,
    filename: Option<String>,
    bytes: Vec<u8>,
) -> Result<UploadResponse, ApiError> {
    let filename = filename.unwrap_or_default();
    if filename.is_empty() {
        return Err(ApiError::bad_request("No se seleccionó ningún archivo"));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("El archivo debe ser un PDF"));
    }

    info!("Processing upload '{}' ({} bytes)", filename, bytes.len());

    let result = tokio::task::spawn_blocking(move || {
        let document = PdfDocument::from_bytes(&bytes)?;
        SegmentationEngine::new().process(&document)
    })
    .await
    .map_err(|e| {
        error!("Processing task failed: {}", e);
        ApiError::internal()
    })??;

    store_result(&state, &filename, result)
}

/// Stores the produced files and builds the upload response. Finding markers
/// but producing no file at all is a server-side failure, not a success.
fn store_result(
    state: &AppState,
    filename: &str,
    result: ProcessingResult,
) -> Result<UploadResponse, ApiError> {
    if !result.has_courses() {
        warn!("No courses found in '{}'", filename);
        return Err(ApiError::bad_request(format!(
            "No se encontraron cursos con el marcador \"{}\"",
            MARKER
        )));
    }

    if result.courses.is_empty() {
        error!(
            "All {} segments of '{}' failed to copy",
            result.failures.len(),
            filename
        );
        return Err(ApiError::internal());
    }

    let courses = result.manifest();
    let total_pages = result.total_pages;
    let message = result.message.clone();
    let failures = result.failures.clone();
    let result_id = state.store.insert(result.into_files());

    info!("Stored {} courses as result {}", courses.len(), result_id);

    Ok(UploadResponse {
        success: true,
        result_id,
        courses,
        total_pages,
        message,
        failures,
    })
}

pub async fn download_file(
    State(state): State<AppState>,
    Path((result_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let bytes = state.store.get_file(&result_id, &filename)?;
    Ok(attachment("application/pdf", &filename, bytes))
}

pub async fn download_all(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> Result<Response, ApiError> {
    let files = state.store.get_all(&result_id)?;
    let archive = ArchiveBuilder::build_zip(DEFAULT_OUTPUT_FOLDER, &files)?;
    Ok(attachment(
        "application/zip",
        &format!("{}.zip", DEFAULT_OUTPUT_FOLDER),
        archive,
    ))
}

fn attachment(content_type: &str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pdf::build_test_pdf;
    use crate::services::MemoryResultStore;
    use crate::types::{CourseSegment, ProcessingOutcome};
    use std::time::Duration;

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryResultStore::new(Duration::from_secs(60), 8)),
        }
    }

    #[tokio::test]
    async fn test_rejects_missing_and_non_pdf_uploads() {
        let err = process_pdf_upload(state(), None, vec![1, 2, 3]).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = process_pdf_upload(state(), Some("notas.txt".into()), vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "El archivo debe ser un PDF");
    }

    #[tokio::test]
    async fn test_rejects_unreadable_pdf() {
        let err = process_pdf_upload(state(), Some("silabos.pdf".into()), b"garbage".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_courses_is_bad_request() {
        let bytes = build_test_pdf(&["Sin marcador", "Nada por aqui"]);
        let err = process_pdf_upload(state(), Some("silabos.PDF".into()), bytes)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("No se encontraron cursos"));
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let state = state();
        let bytes = build_test_pdf(&[
            "Sílabo del Curso\nALGEBRA",
            "temario",
            "Sílabo del Curso\nFISICA",
        ]);

        let response = process_pdf_upload(state.clone(), Some("silabos.pdf".into()), bytes)
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.courses.len(), 2);
        assert_eq!(response.courses[0].range, "1-2");
        assert_eq!(response.courses[1].filename, "FISICA.pdf");

        let file = download_file(
            State(state.clone()),
            Path((response.result_id.clone(), "FISICA.pdf".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(file.status(), StatusCode::OK);
        assert_eq!(file.headers()[header::CONTENT_TYPE], "application/pdf");

        let bundle = download_all(State(state), Path(response.result_id)).await.unwrap();
        assert_eq!(bundle.headers()[header::CONTENT_TYPE], "application/zip");
    }

    #[tokio::test]
    async fn test_unknown_result_and_file_are_not_found() {
        let state = state();
        let err = download_all(State(state.clone()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let id = state.store.insert(vec![("ALGEBRA.pdf".to_string(), vec![1])]);
        let err = download_file(State(state), Path((id, "FISICA.pdf".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Archivo no encontrado");
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let err: ApiError = SyllabusSplitterError::OutputDirectory {
            reason: "disk on fire".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_all_segments_failing_is_internal_error() {
        let store = Arc::new(MemoryResultStore::new(Duration::from_secs(60), 8));
        let state = AppState {
            store: store.clone(),
        };
        let failures = ["ALGEBRA", "FISICA"]
            .iter()
            .enumerate()
            .map(|(idx, name)| SegmentFailure {
                segment: CourseSegment::new(*name, idx * 2, idx * 2 + 1),
                reason: "copy failed".to_string(),
            })
            .collect();
        let result = ProcessingResult {
            total_pages: 4,
            courses: Vec::new(),
            failures,
            unknown_titles: 0,
            message: "Se procesaron 0 cursos exitosamente".to_string(),
            outcome: ProcessingOutcome::Processed,
        };

        let err = store_result(&state, "silabos.pdf", result).unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.is_empty());
    }
}
