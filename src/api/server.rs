//! API server setup: middleware stack, bind, graceful shutdown.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::ApiConfig;
use crate::engine::{BingoEngine, ManualTicker};
use crate::token::InMemoryLedger;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

pub struct ApiServer {
    config: ApiConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(
        config: ApiConfig,
        engine: Arc<BingoEngine>,
        ledger: Arc<InMemoryLedger>,
        ticker: Arc<ManualTicker>,
    ) -> Self {
        let state = Arc::new(AppState {
            engine,
            ledger,
            ticker,
            version: env!("CARGO_PKG_VERSION").to_string(),
        });
        Self { config, state }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.create_app();
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("bingopool API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }

    fn create_app(&self) -> axum::Router {
        // Last-added layer is outermost: the request id exists before
        // anything logs it.
        create_router(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&self.config.cors_origins))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_server(cors_origins: Vec<String>) -> ApiServer {
        let ledger = Arc::new(InMemoryLedger::new());
        let ticker = Arc::new(ManualTicker::new(0));
        let engine = Arc::new(BingoEngine::new(
            GameConfig::default(),
            ledger.clone(),
            ticker.clone(),
        ));
        let config = ApiConfig {
            cors_origins,
            ..ApiConfig::default()
        };
        ApiServer::new(config, engine, ledger, ticker)
    }

    #[tokio::test]
    async fn test_full_stack_serves_health() {
        let app = test_server(vec!["*".to_string()]).create_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // The request-id middleware wraps the whole stack.
        assert!(response.headers().contains_key("x-request-id"));
    }
}
