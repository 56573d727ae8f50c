use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::dispatch::{dispatch, ActionRequest, ActionResponse};
use crate::registry::CompanyRegistry;
use crate::sheets::{GoogleSheetsClient, SheetsApi};

/// Shared, read-only application state. All durable state lives in the
/// remote spreadsheet; nothing here mutates after startup.
pub struct AppState {
    pub registry: CompanyRegistry,
    pub sheets: Arc<dyn SheetsApi>,
}

/// Build the router: the landing page plus the single action-dispatched API
/// endpoint. CORS is permissive because the client widget is embedded in
/// pages served from elsewhere.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/api", get(handle_action))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web service with the given configuration.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let token = config.token()?;
    // reqwest's blocking client may not be built on an async worker thread.
    let base_url = config.sheets_base_url.clone();
    let sheets =
        tokio::task::spawn_blocking(move || GoogleSheetsClient::new(base_url, token)).await??;
    let state = Arc::new(AppState {
        registry: config.registry(),
        sheets: Arc::new(sheets),
    });

    let listener = TcpListener::bind(&config.listen).await?;
    info!("Listening on http://{}", config.listen);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

/// The single API handler. The dispatcher does blocking remote round trips,
/// so it runs on the blocking pool; whatever happens, the client gets HTTP
/// 200 with a JSON body.
async fn handle_action(
    State(state): State<Arc<AppState>>,
    Query(req): Query<ActionRequest>,
) -> Json<ActionResponse> {
    let result =
        tokio::task::spawn_blocking(move || dispatch(&state.registry, state.sheets.as_ref(), &req))
            .await;
    match result {
        Ok(resp) => Json(resp),
        Err(e) => Json(ActionResponse::Error {
            error: format!("internal error: {e}"),
        }),
    }
}
