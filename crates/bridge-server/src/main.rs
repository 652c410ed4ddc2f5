mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use bridge_api::AppStateInner;
use bridge_db::Database;
use bridge_gateway::{Dispatcher, GatewayContext, handle_connection, verify_token};
use bridge_social::{
    Clock, ConnectionGraph, ConnectionService, ConversationAggregator, Directory, MessageStore,
    MessagingService, PresenceTracker, SystemClock,
};

use crate::config::ServerConfig;

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "alumnibridge=debug,bridge_api=debug,bridge_gateway=debug,bridge_social=debug,bridge_db=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dispatcher = Dispatcher::new();

    let connections: Arc<dyn ConnectionService> =
        Arc::new(ConnectionGraph::new(db.clone(), clock.clone()));
    let messaging: Arc<dyn MessagingService> = Arc::new(MessageStore::new(
        db.clone(),
        clock.clone(),
        Arc::new(dispatcher.clone()),
    )?);
    let presence = PresenceTracker::new(db.clone(), clock);
    let directory = Directory::new(db);
    let aggregator = ConversationAggregator::new(
        connections.clone(),
        messaging.clone(),
        presence.clone(),
        directory.clone(),
    );

    let gateway = GatewayContext {
        dispatcher,
        messaging: messaging.clone(),
        presence: presence.clone(),
        jwt_secret: config.jwt_secret.clone(),
    };

    let app_state = Arc::new(AppStateInner {
        connections,
        messaging,
        presence,
        aggregator,
        directory,
        jwt_secret: config.jwt_secret.clone(),
    });

    let ws_route = Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(gateway);

    let app = Router::new()
        .merge(bridge_api::router(app_state))
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("AlumniBridge server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// A `?token=` query authenticates at upgrade time. Without one the client
/// must send `identify` after connecting.
async fn ws_upgrade(
    State(ctx): State<GatewayContext>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let pre_authenticated = match query.token {
        Some(token) => match verify_token(&ctx.jwt_secret, &token) {
            Some(claims) => Some(claims.sub),
            None => {
                warn!("Rejected WebSocket upgrade with invalid token");
                return StatusCode::UNAUTHORIZED.into_response();
            }
        },
        None => None,
    };

    ws.on_upgrade(move |socket| handle_connection(socket, ctx, pre_authenticated))
}
