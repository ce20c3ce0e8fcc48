use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    GroupService, InviteService, PaymentService, RandomWinnerPicker, RoundService,
};
use domain::stores::Stores;
use shared::jwt::JwtConfig;

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, PhoneRateLimiter,
};
use crate::routes::{auth, groups, health, invites, payments, rounds, users};
use crate::services::auth::AuthService;
use crate::services::sms::SmsService;
use crate::services::storage::build_proof_storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub stores: Stores,
    pub auth: AuthService,
    pub groups: GroupService,
    pub invites: InviteService,
    pub rounds: RoundService,
    pub payments: PaymentService,
    /// Present when backed by PostgreSQL; health probes ping it.
    pub pool: Option<PgPool>,
}

pub fn create_app(config: Config, jwt: JwtConfig, stores: Stores, pool: Option<PgPool>) -> Router {
    let config = Arc::new(config);
    let jwt = Arc::new(jwt);

    let sms = SmsService::new(config.sms.clone());
    let proof_storage = build_proof_storage(&config.storage);
    let otp_limiter = Arc::new(PhoneRateLimiter::new(
        config.security.otp_request_limit_per_hour,
    ));

    let auth_service = AuthService::new(
        stores.clone(),
        jwt.clone(),
        sms,
        otp_limiter,
        &config.otp,
        config.jwt.access_token_expiry_secs,
    );

    let state = AppState {
        config: config.clone(),
        jwt,
        stores: stores.clone(),
        auth: auth_service,
        groups: GroupService::new(stores.clone()),
        invites: InviteService::new(stores.clone()),
        rounds: RoundService::new(stores.clone(), Arc::new(RandomWinnerPicker)),
        payments: PaymentService::new(stores, proof_storage),
        pool,
    };

    let cors = build_cors(&config.security.cors_origins);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/otp/request", post(auth::request_otp))
        .route("/api/v1/auth/otp/verify", post(auth::verify_otp))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/invites/:code", get(invites::preview_invite));

    // Protected routes; each handler takes the UserAuth extractor.
    let protected_routes = Router::new()
        .route("/api/v1/users/me", get(users::get_me).put(users::update_me))
        .route(
            "/api/v1/groups",
            post(groups::create_group).get(groups::list_groups),
        )
        .route(
            "/api/v1/groups/:group_id",
            get(groups::get_group).put(groups::update_group),
        )
        .route(
            "/api/v1/groups/:group_id/members",
            get(groups::list_members),
        )
        .route("/api/v1/groups/:group_id/leave", post(groups::leave_group))
        .route(
            "/api/v1/groups/:group_id/members/:user_id",
            delete(groups::remove_member),
        )
        .route(
            "/api/v1/groups/:group_id/members/:user_id/promote",
            post(groups::promote_member),
        )
        .route(
            "/api/v1/groups/:group_id/invites",
            post(invites::create_invite),
        )
        .route("/api/v1/invites/:code/join", post(invites::join_group))
        .route(
            "/api/v1/groups/:group_id/rounds",
            post(rounds::create_round).get(rounds::list_rounds),
        )
        .route("/api/v1/rounds/:round_id", get(rounds::get_round))
        .route("/api/v1/rounds/:round_id/winner", post(rounds::select_winner))
        .route(
            "/api/v1/rounds/:round_id/complete",
            post(rounds::complete_round),
        )
        .route(
            "/api/v1/rounds/:round_id/payments",
            post(payments::submit_payment).get(payments::list_round_payments),
        )
        .route(
            "/api/v1/payments/:payment_id/verify",
            post(payments::verify_payment),
        )
        .route("/api/v1/payments/me", get(payments::my_payments));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use axum::http::{header, Method};
        use tower_http::cors::AllowOrigin;
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    }
}
