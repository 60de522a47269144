use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use lantern_api::state::{AppState, AppStateInner};
use lantern_api::{history, rooms, send, uploads};
use lantern_gateway::connection;
use lantern_gateway::dispatcher::Dispatcher;
use lantern_store::ChannelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lantern=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("LANTERN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LANTERN_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let log_dir = std::env::var("LANTERN_LOG_DIR").unwrap_or_else(|_| "logs".into());
    let upload_dir = std::env::var("LANTERN_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());

    // Durable channel logs + upload blob directory
    let store = Arc::new(ChannelStore::open(&log_dir)?);
    tokio::fs::create_dir_all(&upload_dir).await?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let state: AppState = Arc::new(AppStateInner {
        store,
        dispatcher,
        upload_dir: PathBuf::from(&upload_dir),
    });

    // Routes
    let api_routes = Router::new()
        .route("/api/history/{channel_id}", get(history::get_history))
        .route("/api/get-logs/{channel_id}", get(history::get_raw_log))
        .route("/api/room/{channel_id}", get(rooms::room_info))
        .route("/api/send-msg", post(send::send_message))
        .route(
            "/api/upload",
            post(uploads::upload_file)
                .layer(DefaultBodyLimit::max(uploads::MAX_FILE_SIZE + 1024 * 1024)),
        )
        .with_state(state.clone());

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(state);

    let app = Router::new()
        .merge(api_routes)
        .merge(ws_route)
        .nest_service("/uploads", ServeDir::new(&upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Lantern server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher.clone(), state.store.clone())
    })
}
