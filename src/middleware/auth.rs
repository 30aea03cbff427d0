use crate::auth::context::UserContext;
use crate::auth::session::{UserSession, SESSION_COOKIE};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use uuid::Uuid;

/// Header naming the profile an API-key caller is acting for.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// Resolves the caller from an API key or the private session cookie and
/// attaches a `UserContext` to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let settings = &state.config;

    // 1. API key (service-to-service or CLI)
    if !settings.api_keys.is_empty() {
        let api_key = headers
            .get(settings.api_key_header.as_str())
            .and_then(|value| value.to_str().ok());

        if let Some(key) = api_key {
            if settings.api_keys.iter().any(|k| k == key) {
                let acting_user = match headers.get(ACTING_USER_HEADER) {
                    Some(value) => Some(
                        value
                            .to_str()
                            .ok()
                            .and_then(|s| Uuid::parse_str(s.trim()).ok())
                            .ok_or_else(|| {
                                ApiError::validation("X-Acting-User must be a profile id")
                            })?,
                    ),
                    None => None,
                };

                request
                    .extensions_mut()
                    .insert(UserContext::new_api_key(acting_user));
                return Ok(next.run(request).await);
            }

            tracing::debug!("Rejected unknown API key");
            return Err(ApiError::authentication("Invalid API key"));
        }
    }

    // 2. Session cookie (browser)
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session) = serde_json::from_str::<UserSession>(cookie.value()) {
            if !session.is_expired() {
                // Roles come from the store so a role change applies to live sessions
                let roles = state.role_manager.roles_of(session.user_id).await?;
                let context = UserContext::new_user(session.user_id, session.email, roles);
                request.extensions_mut().insert(context);
                return Ok(next.run(request).await);
            }
            tracing::debug!("Session {} has expired", session.session_id);
        }
    }

    Err(ApiError::authentication("Authentication required"))
}
