use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    models::Session,
    services::AuthError,
    AppState,
};

/// Authenticate every routed call through the [`AuthGate`](crate::services::AuthGate).
///
/// The operation name is the matched route template. Protected calls get the
/// resolved [`Session`] inserted into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let operation = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let session = state
        .gate
        .authenticate(&operation, authorization)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::Unauthenticated(_)) {
                tracing::debug!(operation = %operation, reason = %e, "Rejected unauthenticated call");
            }
            AppError::from(e)
        })?;

    if let Some(session) = session {
        req.extensions_mut().insert(session);
    }

    Ok(next.run(req).await)
}

/// Extractor for the caller's session. Fails closed with 401 when the request
/// was not authenticated.
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| AuthError::Unauthenticated("Missing session").into())
    }
}
