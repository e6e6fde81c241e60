//! HTTP layer: binds channels to axum request/response pairs and serves the
//! demo page.

use axum::Router;
use log::*;
use service::AppState;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

mod controller;
mod error;
pub mod router;
mod sse;

pub use error::{Error, Result};

/// The complete application router.
pub fn app(app_state: AppState) -> Router {
    router::define_routes(app_state)
}

/// Serve on `listener` until `shutdown` resolves.
///
/// Event streams outlive a graceful shutdown unless their channels are closed,
/// so the shutdown future should close them before resolving.
pub async fn serve<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!("Server starting... listening for connections on http://{local_addr}");

    axum::serve(
        listener,
        app(app_state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
