use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod sales;
pub mod state;
pub mod uploads;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Uploaded product images are served straight off disk
    let storage = ServeDir::new(&state.uploads.dir);

    Router::new()
        .merge(auth::routes())
        .merge(products::routes(state.clone()))
        .merge(orders::routes(state.clone()))
        .merge(sales::routes(state.clone()))
        .merge(uploads::routes(state.clone()))
        .nest_service("/storage", storage)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
