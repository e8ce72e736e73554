use std::env;
use std::path::PathBuf;

use axum::{Router, middleware};
use tokio::net::TcpListener;

use anyhow::anyhow;

use inkvox::{ServerConfig, middleware::auth::auth_middleware, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Load configuration: `inkvox <config.yaml>` or environment-only
    let mut args = env::args();
    let _ = args.next();
    let config = match args.next() {
        Some(path) => {
            if let Some(extra) = args.next() {
                anyhow::bail!("Unexpected argument '{extra}' after config path");
            }
            ServerConfig::from_file(&PathBuf::from(path)).map_err(|e| anyhow!(e.to_string()))?
        }
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };

    let address = config.address();
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    // Create protected API routes with authentication middleware
    let protected_routes = routes::api::create_api_router().layer(middleware::from_fn_with_state(
        app_state.clone(),
        auth_middleware,
    ));

    // Create public health check route (no auth)
    let mut public_routes =
        Router::new().route("/", axum::routing::get(inkvox::handlers::api::health_check));

    // Serve filesystem-stored artifacts directly; artifact URLs point here
    // when ARTIFACTS_PUBLIC_URL is left at its default.
    if let Some(artifacts_path) = &app_state.config.artifacts_path {
        public_routes = public_routes.nest_service(
            "/artifacts",
            tower_http::services::ServeDir::new(artifacts_path),
        );
    }

    // Combine all routes: public + protected
    let app = public_routes.merge(protected_routes).with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    println!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
