mod config;
mod interceptors;
mod services;

pub use interceptors::user::UserExtension;

use clap::Parser;
use config::ServerConfig;
use interceptors::user;
use protobuf::stream_relay_server::StreamRelayServer;
use relaylib::Supervisor;
use services::relayservice::RelayService;
use std::future::Future;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    serve(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c, shut down with a signal instead");
        std::future::pending::<()>().await;
    }
}

/// Serve until `shutdown` resolves, then stop every running stream before returning.
async fn serve(
    config: ServerConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let supervisor = Supervisor::spawn(config.supervisor_config());
    let relay_service = RelayService::new(supervisor.clone(), config.transcoder.as_str());
    let relay_server = StreamRelayServer::with_interceptor(relay_service, user::extract_user_id);
    info!(addr = %config.addr, transcoder = %config.transcoder, "listening");

    Server::builder()
        .add_service(relay_server)
        .serve_with_shutdown(config.addr, shutdown)
        .await?;

    info!("server stopped, stopping running streams");
    supervisor.shutdown().await?;
    Ok(())
}
