// handlers/public/mod.rs - Endpoints that need no authentication

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service name, version and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Cashflow API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "profile": "/api/profile (protected)",
                "wallet": "/api/top-ups, /api/withdrawals (protected)",
                "packages": "/api/packages, /api/purchases (protected)",
                "commissions": "/api/commissions (protected)",
                "payment_methods": "/api/payment-methods (protected)",
                "review": "/api/review/* (admin, merchant)",
                "accounting": "/api/accounting/* (admin, accounting)",
                "admin": "/api/admin/* (admin)",
            }
        }
    }))
}

/// GET /health - Liveness plus database reachability
///
/// Returns 200 when the database answers, 503 with `status: degraded` otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}
