use bookify_backend::bootstrap;
use bookify_config::load_config;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    bookify_common::logging::init();

    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = bootstrap(config).await?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app.router).await?;
    Ok(())
}
