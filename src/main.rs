use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use lanboard_server::config::{generate_config_template, Config};
use lanboard_server::content::store::ContentStore;
use lanboard_server::presence::PresenceRegistry;
use lanboard_server::state::AppState;
use lanboard_server::uploads::store::UploadLog;
use lanboard_server::{network, routes, ws};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lanboard_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lanboard_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("LANBoard server v{} starting", env!("CARGO_PKG_VERSION"));

    // Open the durable stores
    let data_dir = PathBuf::from(&config.data_dir);
    let content = Arc::new(ContentStore::open(&data_dir).await?);
    let uploads = Arc::new(UploadLog::open(&data_dir).await?);

    // Build application state
    let state = AppState {
        content,
        uploads,
        presence: Arc::new(PresenceRegistry::new()),
        connections: ws::new_connection_registry(),
        data_dir,
        max_upload_size_mb: config.max_upload_size_mb(),
    };

    // Build router
    let app = routes::build_router(state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Board reachable on the LAN at http://{}:{}",
        network::local_ip(),
        config.port
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
