use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use jouluristikko::config::Config;
use jouluristikko::server::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let port = config.port;
    let state = AppState::new(config);

    let router = app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Jouluristikko listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
