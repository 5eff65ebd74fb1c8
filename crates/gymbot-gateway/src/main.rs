//! GymBot gateway: HTTP facade between the chat platform and the dialog engine.
//! Inbound updates are posted as JSON; the reply is the next screen to render.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use gymbot_core::store::{default_catalog, CatalogStat};
use gymbot_core::{
    open_stores, CatalogStore, DialogEngine, Event, GymBotConfig, Inbound, ProfileStore,
    Screen, SessionStore, SledCatalog, UserStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct AppState {
    engine: DialogEngine,
    profiles: Arc<dyn ProfileStore>,
    catalog: SledCatalog,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UpdateKind {
    Command,
    Text,
    Callback,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    user_id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    username: Option<String>,
    kind: UpdateKind,
    data: String,
}

#[derive(Debug, Serialize)]
struct Button {
    text: String,
    callback_data: String,
}

#[derive(Debug, Serialize)]
struct ScreenResponse {
    state: gymbot_core::DialogState,
    text: String,
    parse_mode: &'static str,
    keyboard: Vec<Vec<Button>>,
}

impl From<Screen> for ScreenResponse {
    fn from(screen: Screen) -> Self {
        let keyboard = screen
            .keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|choice| Button {
                        text: choice.label.clone(),
                        callback_data: choice.token(),
                    })
                    .collect()
            })
            .collect();
        Self {
            state: screen.state,
            text: screen.text,
            parse_mode: "HTML",
            keyboard,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GymBotConfig::load()?;
    let (profiles, catalog) = open_stores(&config.storage_path)?;

    if config.seed_catalog_on_boot {
        let report = catalog.seed_missing(default_catalog()?)?;
        tracing::info!(
            target: "gymbot::gateway",
            added = report.added_total(),
            total = report.total,
            "Catalog ready"
        );
    }

    let profiles: Arc<dyn ProfileStore> = Arc::new(profiles);
    let catalog_store: Arc<dyn CatalogStore> = Arc::new(catalog.clone());
    let engine = DialogEngine::new(
        Arc::clone(&profiles),
        catalog_store,
        SessionStore::new(),
        config.store_timeout(),
    );

    let state = Arc::new(AppState {
        engine,
        profiles,
        catalog,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/updates", post(update_handler))
        .route("/api/v1/users/:id/stats", get(user_stats_handler))
        .route("/api/v1/catalog/stats", get(catalog_stats_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        target: "gymbot::gateway",
        app = %config.app_name,
        addr = %config.bind_addr,
        "Gateway listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "gymbot::gateway",
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request served"
    );
    response
}

async fn health() -> &'static str {
    "OK"
}

/// POST /api/v1/updates: one chat update in, the screen to render out.
async fn update_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<ScreenResponse>, (StatusCode, String)> {
    if body.user_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "user_id is required".to_string()));
    }
    let event = match body.kind {
        UpdateKind::Command => Event::Command(body.data),
        UpdateKind::Text => Event::Text(body.data),
        UpdateKind::Callback => Event::Callback(body.data),
    };
    let mut inbound = Inbound::new(body.user_id, body.first_name, event);
    inbound.username = body.username;

    let screen = state.engine.handle(&inbound).await;
    Ok(Json(screen.into()))
}

async fn user_stats_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, (StatusCode, String)> {
    let stats = state
        .profiles
        .user_stats(&user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    stats
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown user {user_id}")))
}

async fn catalog_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogStat>>, (StatusCode, String)> {
    state
        .catalog
        .stats()
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
