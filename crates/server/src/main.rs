use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
    Json, Router,
};
use server_api::{
    create_counter, fetch_counter, get_counter_value, get_or_create_counter, increment_counter,
    reset_counter, update_counter, CounterContext,
};
use shared::{
    domain::{CounterUpdate, NewCounter, DEFAULT_COUNTER_NAME},
    error::{ApiError, ErrorCode},
    protocol::{CounterResponse, CounterValueResponse, Notice},
};
use storage::Storage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod page;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use page::render_counter_page;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let state = AppState {
        counters: CounterContext::new(storage.clone()),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.pool().close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c; shutting down");
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(index))
        .route("/counter", get(counter_page))
        .route("/counter/increment", post(page_increment))
        .route("/counter/reset", post(page_reset))
        .route("/api/counters", post(http_create_counter))
        .route(
            "/api/counters/:name",
            get(http_fetch_counter).put(http_update_counter),
        )
        .route("/api/counters/:name/get_or_create", post(http_get_or_create))
        .route("/api/counters/:name/increment", post(http_increment))
        .route("/api/counters/:name/reset", post(http_reset))
        .route("/api/counters/:name/value", get(http_counter_value))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.counters.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn index() -> Redirect {
    Redirect::to("/counter")
}

async fn counter_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, HttpError> {
    let counter = get_or_create_counter(&state.counters, DEFAULT_COUNTER_NAME)
        .await
        .map_err(http_error)?;
    Ok(Html(render_counter_page(counter.count, None)))
}

async fn page_increment(State(state): State<Arc<AppState>>) -> Result<Html<String>, HttpError> {
    let counter = increment_counter(&state.counters, DEFAULT_COUNTER_NAME)
        .await
        .map_err(http_error)?;
    let notice = Notice::incremented(counter.count);
    Ok(Html(render_counter_page(counter.count, Some(&notice))))
}

async fn page_reset(State(state): State<Arc<AppState>>) -> Result<Html<String>, HttpError> {
    let html = match reset_counter(&state.counters, DEFAULT_COUNTER_NAME)
        .await
        .map_err(http_error)?
    {
        Some(counter) => render_counter_page(counter.count, Some(&Notice::reset())),
        // Nothing to reset; show whatever the page would show.
        None => {
            let count = get_counter_value(&state.counters, DEFAULT_COUNTER_NAME)
                .await
                .map_err(http_error)?;
            render_counter_page(count, None)
        }
    };
    Ok(Html(html))
}

async fn http_create_counter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewCounter>,
) -> Result<(StatusCode, Json<CounterResponse>), HttpError> {
    let counter = create_counter(&state.counters, req)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(counter.into())))
}

async fn http_fetch_counter(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CounterResponse>, HttpError> {
    let counter = fetch_counter(&state.counters, &name)
        .await
        .map_err(http_error)?
        .ok_or_else(|| not_found(&name))?;
    Ok(Json(counter.into()))
}

async fn http_update_counter(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CounterUpdate>,
) -> Result<Json<CounterResponse>, HttpError> {
    let counter = update_counter(&state.counters, &name, req)
        .await
        .map_err(http_error)?
        .ok_or_else(|| not_found(&name))?;
    Ok(Json(counter.into()))
}

async fn http_get_or_create(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CounterResponse>, HttpError> {
    let counter = get_or_create_counter(&state.counters, &name)
        .await
        .map_err(http_error)?;
    Ok(Json(counter.into()))
}

async fn http_increment(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CounterResponse>, HttpError> {
    let counter = increment_counter(&state.counters, &name)
        .await
        .map_err(http_error)?;
    Ok(Json(counter.into()))
}

async fn http_reset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CounterResponse>, HttpError> {
    let counter = reset_counter(&state.counters, &name)
        .await
        .map_err(http_error)?
        .ok_or_else(|| not_found(&name))?;
    Ok(Json(counter.into()))
}

async fn http_counter_value(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CounterValueResponse>, HttpError> {
    let count = get_counter_value(&state.counters, &name)
        .await
        .map_err(http_error)?;
    Ok(Json(CounterValueResponse { name, count }))
}

fn not_found(name: &str) -> HttpError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(
            ErrorCode::NotFound,
            format!("counter '{name}' not found"),
        )),
    )
}

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "counter operation failed");
    }
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
