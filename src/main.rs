use log::*;
use service::{config::Config, logging::Logger, AppState};
use tokio::net::TcpListener;

mod demo;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!("Starting up SSE channel server...");

    let channels = service::init_channels(&config);
    let app_state = AppState::new(config, channels);

    if app_state.config.demo_publisher_enabled() {
        tokio::spawn(demo::publish_random_values(app_state.channels.clone()));
    }

    let listener = match TcpListener::bind(app_state.config.listen_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(
                "Failed to bind {}: {e}",
                app_state.config.listen_address()
            );
            std::process::exit(1);
        }
    };

    // Streams only finish once their channels are closed, so close them
    // before the server waits for connections to drain
    let channels = app_state.channels.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
        }
        info!("Shutting down, closing all channels");
        channels.close_all();
    };

    if let Err(e) = web::serve(listener, app_state, shutdown).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
