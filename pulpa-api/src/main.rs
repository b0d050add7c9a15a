use pulpa_api::{
    app,
    state::{AppState, AuthSettings, UploadSettings},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulpa_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = pulpa_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Pulpa API on port {}", config.server.port);

    let db = pulpa_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let app_state = AppState {
        product_repo: Arc::new(pulpa_store::StoreProductRepository::new(db.pool.clone())),
        order_repo: Arc::new(pulpa_store::StoreOrderRepository::new(db.pool.clone())),
        sales_repo: Arc::new(pulpa_store::StoreSalesRepository::new(db.pool.clone())),
        auth: AuthSettings {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            staff_passcode: config.auth.staff_passcode.clone(),
        },
        uploads: UploadSettings {
            dir: config.uploads.dir.clone(),
            base_url: config.uploads.base_url.clone(),
            max_upload_bytes: config.uploads.max_upload_bytes,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
