use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::client::CompletionService;
use crate::generator;
use crate::parser::FormulaAssignment;
use crate::pipeline::{self, GenerateError, Generation};
use crate::upload;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct AppState<C> {
    client: C,
    // Most recent generation, so repeated downloads never re-invoke the
    // completion service.
    last: Mutex<Option<Generation>>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
    #[serde(default)]
    source_data: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    success: bool,
    description: String,
    headers: Vec<String>,
    formulas: Vec<FormulaAssignment>,
    modifications: Vec<String>,
}

#[derive(Deserialize)]
struct EnhanceRequest {
    prompt: String,
}

#[derive(Serialize)]
struct EnhanceResponse {
    success: bool,
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ErrorResponse {
    fn json(error: impl ToString) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            success: false,
            error: error.to_string(),
        })
    }
}

pub async fn run<C>(client: C, port: u16) -> Result<(), Box<dyn std::error::Error>>
where
    C: CompletionService + Send + Sync + 'static,
{
    let state = Arc::new(AppState {
        client,
        last: Mutex::new(None),
    });

    let app = router(state);

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    log::info!("listening on http://127.0.0.1:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: CompletionService + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(serve_index))
        .route("/api/generate", post(generate_spreadsheet::<C>))
        .route("/api/enhance", post(enhance_prompt::<C>))
        .route("/api/download", get(download_spreadsheet::<C>))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn generate_spreadsheet<C>(
    State(state): State<Arc<AppState<C>>>,
    Json(payload): Json<GenerateRequest>,
) -> Response
where
    C: CompletionService + Send + Sync + 'static,
{
    let source = payload
        .source_data
        .as_deref()
        .and_then(upload::parse_delimited);

    match pipeline::generate(&state.client, &payload.prompt, source.as_ref()).await {
        Ok(generation) => {
            let spec = &generation.spec;
            let body = GenerateResponse {
                success: true,
                description: spec.description.clone(),
                headers: spec.headers.clone(),
                formulas: spec.formulas.clone(),
                modifications: spec.modifications.clone(),
            };
            *state.last.lock().unwrap() = Some(generation);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log::error!("generation failed: {e}");
            (error_status(&e), ErrorResponse::json(e)).into_response()
        }
    }
}

async fn enhance_prompt<C>(
    State(state): State<Arc<AppState<C>>>,
    Json(payload): Json<EnhanceRequest>,
) -> Response
where
    C: CompletionService + Send + Sync + 'static,
{
    match pipeline::enhance(&state.client, &payload.prompt).await {
        Ok(result) => (
            StatusCode::OK,
            Json(EnhanceResponse {
                success: true,
                result,
            }),
        )
            .into_response(),
        Err(e) => {
            log::error!("enhancement failed: {e}");
            (error_status(&e), ErrorResponse::json(e)).into_response()
        }
    }
}

async fn download_spreadsheet<C>(State(state): State<Arc<AppState<C>>>) -> Response
where
    C: CompletionService + Send + Sync + 'static,
{
    let spec = state
        .last
        .lock()
        .unwrap()
        .as_ref()
        .map(|generation| generation.spec.clone());

    let Some(spec) = spec else {
        return (
            StatusCode::NOT_FOUND,
            ErrorResponse::json("nothing has been generated yet"),
        )
            .into_response();
    };

    match generator::to_xlsx(&spec) {
        Ok(buffer) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, XLSX_MIME)
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"spreadsheet.xlsx\"",
            )
            .body(axum::body::Body::from(buffer))
            .unwrap(),
        Err(e) => {
            log::error!("assembly failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::json(e)).into_response()
        }
    }
}

fn error_status(e: &GenerateError) -> StatusCode {
    match e {
        GenerateError::EmptyPrompt => StatusCode::BAD_REQUEST,
        GenerateError::Completion(_) => StatusCode::BAD_GATEWAY,
    }
}
