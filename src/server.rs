//! HTTP server for bid table generation
//!
//! The request surface consumes already-normalized documents (ordered
//! page/sheet text produced by the external normalizer) and returns the
//! aggregated `BidResult` for the external workbook writer. Per-topic
//! failures surface as `Failed` topics in the body, never as HTTP errors.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::engine::BidEngine;
use crate::types::{BidResult, DocumentLocation, Locator};

const DEFAULT_PROJECT_NAME: &str = "Unnamed Project";

/// One normalized page or sheet of an uploaded document
#[derive(Debug, Deserialize)]
pub struct PageInput {
    pub locator: Locator,
    pub text: String,
}

/// One uploaded document after normalization
#[derive(Debug, Deserialize)]
pub struct DocumentInput {
    pub name: String,
    pub pages: Vec<PageInput>,
}

/// Request body for bid table generation
#[derive(Debug, Deserialize)]
pub struct GenerateBidRequest {
    #[serde(default)]
    pub project_name: Option<String>,
    pub documents: Vec<DocumentInput>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Generate bid tables handler
async fn generate_handler(
    State(engine): State<Arc<BidEngine>>,
    Json(req): Json<GenerateBidRequest>,
) -> Result<Json<BidResult>, (StatusCode, Json<ErrorResponse>)> {
    if req.documents.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "no documents provided".to_string(),
            }),
        ));
    }

    let project_name = req
        .project_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

    let docs: Vec<(DocumentLocation, String)> = req
        .documents
        .into_iter()
        .flat_map(|doc| {
            let name = doc.name;
            doc.pages
                .into_iter()
                .map(move |page| {
                    (
                        DocumentLocation {
                            document_name: name.clone(),
                            locator: page.locator,
                        },
                        page.text,
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect();

    info!(
        "Received generate request: project='{}', {} locations",
        project_name,
        docs.len()
    );

    let result = engine.generate(&project_name, &docs).await;

    Ok(Json(result))
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "bidtab".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create and configure the HTTP router
pub fn create_router(engine: Arc<BidEngine>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate-bid", post(generate_handler))
        .with_state(engine)
}

/// Run the HTTP server
pub async fn run_server(engine: Arc<BidEngine>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting bidtab server on {}", addr);

    let app = create_router(engine);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
