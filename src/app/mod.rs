pub mod orchestrator;
pub mod wrapper;

use crate::domain::model::PostalCodeRequest;
use crate::utils::error::Result;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Decode the first JSON value of a `{"cep": ...}` body; anything after it is
/// ignored. `None` means the caller gets a bare 400.
pub(crate) fn decode_request(body: &[u8]) -> Option<PostalCodeRequest> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<PostalCodeRequest>();
    match values.next() {
        Some(Ok(request)) => Some(request),
        Some(Err(e)) => {
            tracing::debug!("Rejected request body: {}", e);
            None
        }
        None => {
            tracing::debug!("Rejected empty request body");
            None
        }
    }
}

/// Serve `app` on `listener` until `shutdown` resolves, then let in-flight
/// requests finish.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server on {} shut down gracefully", addr);
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
