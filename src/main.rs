use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kr_study_portal::{api::ApiClient, app, config, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kr_study_portal=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = config::load().expect("Failed to load configuration");
  let api = ApiClient::new(&config.backend).expect("Failed to build HTTP client");
  tracing::info!("Backend API at {}", api.base_url());

  let bind_addr = config.server.bind_addr();
  let port = config.server.port;
  let app = app(AppState::new(api, config));

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", port);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
