use mock_server::Fixture;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let fixture = match std::env::var("MOCK_FIXTURE") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)?;
            info!(%path, "loaded fixture");
            serde_json::from_str(&raw)?
        }
        Err(_) => Fixture::new("admin", "admin"),
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, folders = fixture.folders.len(), configs = fixture.configs.len(), "listening");
    mock_server::run(listener, fixture).await?;
    Ok(())
}
