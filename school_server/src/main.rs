use school_core::{config, SchoolCore};
use school_server::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::get_or_init().await?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let core = SchoolCore::start_with(config).await?;
    let addr = core.config.listen_addr.clone();
    let app = school_server::app(AppState::new(core));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
