//! `todo-server` entry point.

use log::info;
use std::error::Error;
use todo_core::init_logging;
use todo_server::{app_with_state, AppState, ServerConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let service = config.open_service()?;
    let app = app_with_state(AppState::new(service, config.request_timeout));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "event=server_start module=server status=ok addr={} db_path={} request_timeout_ms={}",
        addr,
        config.db_path,
        config.request_timeout.as_millis()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; serve until the process is killed.
        std::future::pending::<()>().await;
    }
}
