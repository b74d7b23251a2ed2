use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, require_roles, ACCOUNTANTS, ADMINS, REVIEWERS};
use crate::state::AppState;

/// The full HTTP surface: public routes, then everything under `/api` behind
/// bearer authentication, with role allow-lists per elevated group
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(protected_routes())
        .merge(review_routes().route_layer(from_fn_with_state(REVIEWERS, require_roles)))
        .merge(accounting_routes().route_layer(from_fn_with_state(ACCOUNTANTS, require_roles)))
        .merge(admin_routes().route_layer(from_fn_with_state(ADMINS, require_roles)))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(api)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.security)),
        )
        .with_state(state)
}

fn protected_routes() -> Router<AppState> {
    use protected::{commissions, packages, payment_methods, profile, wallet};

    Router::new()
        .route("/api/profile", get(profile::profile_get))
        .route("/api/top-ups", get(wallet::top_ups_list).post(wallet::top_ups_create))
        .route("/api/withdrawals", get(wallet::withdrawals_list).post(wallet::withdrawals_create))
        .route("/api/commissions", get(commissions::commissions_list))
        .route("/api/packages", get(packages::packages_list))
        .route("/api/packages/:id/purchase", post(packages::package_purchase))
        .route("/api/purchases", get(packages::purchases_list))
        .route("/api/payment-methods", get(payment_methods::payment_methods_list))
}

fn review_routes() -> Router<AppState> {
    use elevated::review;

    Router::new()
        .route("/api/review/top-ups", get(review::top_ups_list))
        .route("/api/review/top-ups/:id", post(review::top_up_review))
        .route("/api/review/withdrawals", get(review::withdrawals_list))
        .route("/api/review/withdrawals/:id", post(review::withdrawal_review))
}

fn accounting_routes() -> Router<AppState> {
    use elevated::accounting;

    Router::new()
        .route("/api/accounting/cashflow", get(accounting::cashflow_get))
        .route("/api/accounting/commissions", get(accounting::commissions_list))
        .route("/api/accounting/commissions/:id", patch(accounting::commission_update))
}

fn admin_routes() -> Router<AppState> {
    use elevated::admin;

    Router::new()
        .route("/api/admin/packages", post(admin::package_create))
        .route("/api/admin/packages/:id", put(admin::package_update).delete(admin::package_delete))
        .route(
            "/api/admin/payment-methods",
            get(admin::payment_methods_list).post(admin::payment_method_create),
        )
        .route(
            "/api/admin/payment-methods/:id",
            put(admin::payment_method_update).delete(admin::payment_method_delete),
        )
        .route("/api/admin/users", get(admin::users_list))
        .route("/api/admin/users/:id/role", put(admin::user_role_update))
        .route("/api/admin/impersonate", post(admin::impersonate))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
