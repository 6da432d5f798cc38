pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AuthConfig;
use crate::services::{
    AuthGate, AuthService, CompanyService, CredentialStore, EmailProvider, OtpIssuer,
    SessionCache, TokenMinter,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::request_otp,
        handlers::auth::login,
        handlers::user::get_me,
        handlers::company::create_company,
        handlers::company::select_company,
        handlers::company::invite_user,
        handlers::company::list_members,
        handlers::company::remove_member,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::HealthResponse,
            dtos::auth::RequestOtpRequest,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::ProfileResponse,
            dtos::company::CreateCompanyRequest,
            dtos::company::SelectCompanyRequest,
            dtos::company::InviteUserRequest,
            dtos::company::InviteUserResponse,
            dtos::company::CompanyResponse,
            dtos::company::UserCompanyResponse,
            dtos::company::MemberResponse,
            models::CompanyRole,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "One-time code login"),
        (name = "User", description = "Caller profile"),
        (name = "Company", description = "Companies, selection and membership"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn CredentialStore>,
    pub cache: SessionCache,
    pub gate: AuthGate,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub otp_rate_limiter: IpRateLimiter,
    pub login_rate_limiter: IpRateLimiter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services around one store, mailer and session cache.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn EmailProvider>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let cache = SessionCache::new();
        let otp = OtpIssuer::new(store.clone(), mailer, config.otp.clone());
        let tokens = TokenMinter::new(store.clone(), config.token_bytes);
        let limits = &config.rate_limit;

        Self {
            gate: AuthGate::new(cache.clone(), store.clone()),
            auth_service: AuthService::new(store.clone(), otp, tokens, cache.clone()),
            company_service: CompanyService::new(store.clone(), cache.clone()),
            otp_rate_limiter: create_ip_rate_limiter(limits.otp_attempts, limits.otp_window_seconds),
            login_rate_limiter: create_ip_rate_limiter(
                limits.login_attempts,
                limits.login_window_seconds,
            ),
            cache,
            store,
            metrics,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let otp_route = Router::new()
        .route("/auth/otp", post(handlers::auth::request_otp))
        .layer(from_fn_with_state(
            state.otp_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(otp_route)
        .merge(login_route)
        .route("/users/me", get(handlers::user::get_me))
        .route("/companies", post(handlers::company::create_company))
        .route("/companies/select", post(handlers::company::select_company))
        .route(
            "/companies/invitations",
            post(handlers::company::invite_user),
        )
        .route("/companies/members", get(handlers::company::list_members))
        .route(
            "/companies/members/:user_id",
            delete(handlers::company::remove_member),
        )
        // Gate every matched route; public ones pass through untouched
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}
