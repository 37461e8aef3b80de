//! HTTP front end. Every GET is dispatched on its path and query string; the
//! body is the handle's JSON or the fault envelope.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::{error, info};

use crate::core::{dispatch_path, CommandRunner, Fault, Registry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(registry: Registry, runner: impl CommandRunner + 'static) -> Self {
        Self {
            registry: Arc::new(registry),
            runner: Arc::new(runner),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dispatch))
        .route("/{*path}", get(dispatch))
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    // Host commands block; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        dispatch_path(&state.registry, state.runner.as_ref(), &path)
    })
    .await;

    match outcome {
        Ok(Ok(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(Err(fault)) => fault_response(&fault),
        Err(e) => {
            error!(error = %e, "dispatch task failed");
            fault_response(&Fault::new(format!("internal error: {}", e)))
        }
    }
}

fn fault_response(fault: &Fault) -> Response {
    let status = if fault.is_routing() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(fault.to_json())).into_response()
}

/// Serve until Ctrl-C or SIGTERM, letting in-flight requests finish.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, routes = state.registry.len(), "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CommandsSection, RoutesSection};
    use crate::core::runner::testing::ScriptedRunner;
    use crate::handles;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(runner: ScriptedRunner) -> Router {
        let mut reg = Registry::default();
        handles::register_all(&mut reg, &RoutesSection::default(), &CommandsSection::default());
        router(AppState::new(reg, runner))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_lsusb_ok() {
        let runner = ScriptedRunner::new()
            .with_output("lsusb", "Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub\n");
        let (status, body) = get_json(app(runner), "/hal/hwc/lsusb").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["manufacture_id"], "1d6b");
        assert_eq!(body[0]["manufacture_device_name"], "Linux Foundation 3.0 root hub");
    }

    #[tokio::test]
    async fn test_query_string_still_matches() {
        let runner = ScriptedRunner::new().with_output("lscpu", "Model name: Ryzen\n");
        let (status, body) = get_json(app(runner), "/proxy/hal/hwc/lscpu?fresh=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"model_name": "Ryzen"}));
    }

    #[tokio::test]
    async fn test_unsupported_path_is_404_envelope() {
        let (status, body) = get_json(app(ScriptedRunner::new()), "/hal/hwc/dmidecode").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"code": 0, "reason": "This url is not supported: /hal/hwc/dmidecode"})
        );
    }

    #[tokio::test]
    async fn test_root_is_404() {
        let (status, body) = get_json(app(ScriptedRunner::new()), "/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["reason"], "This url is not supported: /");
    }

    #[tokio::test]
    async fn test_command_failure_is_500_envelope() {
        let runner = ScriptedRunner::new()
            .with_fault("lshw", Fault::execution(1, "WARNING: you should run this program as super-user.\n"));
        let (status, body) = get_json(app(runner), "/hal/hwc/lshw").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 1);
        assert_eq!(body["reason"], "WARNING: you should run this program as super-user.\n");
    }
}
