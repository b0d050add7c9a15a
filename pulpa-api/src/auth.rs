use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{StaffClaims, ROLE_STAFF},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    passcode: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/login", post(login))
}

/// POST /v1/auth/login
/// Exchange the register passcode for a staff token
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.passcode != state.auth.staff_passcode {
        return Err(AppError::AuthenticationError(
            "Invalid passcode".to_string(),
        ));
    }

    let claims = StaffClaims {
        sub: format!("staff-{}", Uuid::new_v4()),
        role: ROLE_STAFF.to_owned(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}
