//! HTTP server for the psmtable API.
//!
//! Stateless: every request carries its own upload and options.
//!
//! # API Endpoints
//!
//! | Method | Path                    | Description                          |
//! |--------|-------------------------|--------------------------------------|
//! | GET    | `/health`               | Health check                         |
//! | GET    | `/api/options`          | Default options JSON                 |
//! | POST   | `/api/preview`          | Upload CSV, get the rendered preview |
//! | POST   | `/api/export/{format}`  | Upload CSV, download csv/doc/pdf     |
//! | GET    | `/api/logs`             | SSE stream for real-time logs        |
//!
//! Upload endpoints take `multipart/form-data` with a `file` field and an
//! optional `options` field holding options JSON.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, PreviewResponse};
use crate::config::ServerConfig;
use crate::error::{ExportError, PipelineError, ServerError, ServerResult};
use crate::export::ExportFormat;
use crate::models::PipelineOptions;
use crate::transform::pipeline::{run_bytes, PipelineOutput};
use crate::validation::parse_options;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(_) => StatusCode::BAD_REQUEST,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            ServerError::Pipeline(e) => e.to_string(),
            other => other.to_string(),
        };
        warn!(status = status.as_u16(), "{}", message);
        (status, Json(error_response(&message))).into_response()
    }
}

/// Build the router. Split out from [`start_server`] for tests.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/options", get(default_options))
        .route("/api/preview", post(preview))
        .route("/api/export/{format}", post(export))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C / SIGTERM.
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let addr = config.socket_addr()?;
    let app = router(&config);

    info!("psmtable server running on http://{}", addr);
    info!("   POST /api/preview          - Upload CSV, get preview");
    info!("   POST /api/export/{{format}}  - Upload CSV, download csv/document/pdf");
    info!("   GET  /api/logs             - SSE log stream");
    info!("   Max upload: {} bytes", config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("psmtable server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "psmtable",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "options": "GET /api/options",
            "preview": "POST /api/preview",
            "export": "POST /api/export/{csv|document|pdf}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn default_options() -> Json<PipelineOptions> {
    Json(PipelineOptions::default())
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip missed entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn preview(multipart: Multipart) -> ServerResult<Json<PreviewResponse>> {
    let output = process_upload(multipart).await?;
    Ok(Json(PreviewResponse::from(output)))
}

async fn export(Path(format): Path<String>, multipart: Multipart) -> ServerResult<Response> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: ExportError| ServerError::BadRequest(e.to_string()))?;
    let (output, options) = process_upload_with_options(multipart).await?;
    let bytes = output.export(format, &options.export)?;

    let disposition = format!("attachment; filename=\"{}\"", format.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn process_upload(multipart: Multipart) -> ServerResult<PipelineOutput> {
    Ok(process_upload_with_options(multipart).await?.0)
}

/// Read the form and run the pipeline on it.
async fn process_upload_with_options(multipart: Multipart) -> ServerResult<(PipelineOutput, PipelineOptions)> {
    let form = read_form(multipart).await?;
    info!(
        file = form.file_name.as_deref().unwrap_or("unknown"),
        bytes = form.file.len(),
        "New upload"
    );

    let output = run_bytes(&form.file, &form.options)?;
    Ok((output, form.options))
}

struct UploadForm {
    file: Vec<u8>,
    file_name: Option<String>,
    options: PipelineOptions,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut file: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut options = PipelineOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file = Some(bytes.to_vec());
            }
            "options" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                options = parse_options(&text).map_err(PipelineError::from)?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    Ok(UploadForm {
        file,
        file_name,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, OptionsError};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ServerError::BadRequest("No file provided".into()), StatusCode::BAD_REQUEST),
            (
                ServerError::Pipeline(PipelineError::Extract(ExtractError::NoHeaderFound {
                    marker: "Characteristic".into(),
                })),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Pipeline(PipelineError::Options(OptionsError::Schema(vec!["bad".into()]))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Pipeline(PipelineError::Export(ExportError::NoColumns)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "psmtable");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(&ServerConfig::default());
    }

    const BOUNDARY: &str = "psmtable-boundary";
    const EXPORT_CSV: &str = "TriNetX Analytics Network\n\
                              Characteristic Name,Before: Mean,Before: p-Value\n\
                              Age,45.126,0\n\
                              BMI,27.5,0.2\n";

    /// `(field name, file name, content)` parts as a multipart body.
    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Body {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        Body::from(body)
    }

    async fn post(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(parts))
            .unwrap();
        router(&ServerConfig::default()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_preview_upload() {
        let response = post("/api/preview", &[("file", Some("export.csv"), EXPORT_CSV)]).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["columns"][0], "Characteristic Name");
        assert_eq!(body["rows"][0], json!(["Age", "45.13", "p<.001"]));
        assert_eq!(body["metadata"]["delimiter"], ",");
        assert!(body["html"].as_str().unwrap().contains("<td>BMI</td>"));
    }

    #[tokio::test]
    async fn test_preview_with_options_field() {
        let response = post(
            "/api/preview",
            &[
                ("options", None, r#"{"formatting": {"decimal_places": 1}}"#),
                ("file", Some("export.csv"), EXPORT_CSV),
            ],
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["rows"][0][1], "45.1");
    }

    #[tokio::test]
    async fn test_export_csv_attachment() {
        let response = post("/api/export/csv", &[("file", Some("export.csv"), EXPORT_CSV)]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"formatted_table.csv\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            String::from_utf8(bytes.to_vec()).unwrap(),
            "Characteristic Name,Before: Mean,Before: p-Value\nAge,45.13,p<.001\nBMI,27.5,0.2\n"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let response = post("/api/preview", &[("options", None, "{}")]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Invalid request: No file provided");
    }

    #[tokio::test]
    async fn test_missing_header_is_bad_request() {
        let response = post(
            "/api/preview",
            &[("file", Some("export.csv"), "Name,Value\nAge,45\n")],
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("No header row found"));
    }

    #[tokio::test]
    async fn test_invalid_options_and_format_are_bad_requests() {
        let response = post(
            "/api/preview",
            &[
                ("options", None, r#"{"formatting": {"decimal_places": 9}}"#),
                ("file", Some("export.csv"), EXPORT_CSV),
            ],
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post("/api/export/xlsx", &[("file", Some("export.csv"), EXPORT_CSV)]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
