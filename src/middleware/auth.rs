use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::auth::{AuthError, VerifiedIdentity};
use crate::config::AuthProvider;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::SubjectId;

/// Authenticated caller, injected by [`require_auth`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub subject: SubjectId,
    pub provider: AuthProvider,
    pub claims: Map<String, Value>,
}

impl From<VerifiedIdentity> for AuthUser {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            subject: identity.subject,
            provider: identity.provider,
            claims: identity.claims,
        }
    }
}

/// Bearer token authentication for every identity-scoped route.
///
/// Runs before the handler; on any failure the handler body never executes.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let identity = state.verifier.verify(token).await?;

    tracing::debug!("Authenticated {} via {:?}", identity.subject, identity.provider);

    request.extensions_mut().insert(AuthUser::from(identity));
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::Malformed("Invalid Authorization header format".to_string()))?;

    let (scheme, token) = auth_str.trim().split_once(' ').ok_or(AuthError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed(
            "Authorization header must use Bearer token format".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Missing);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers("bearer   abc")), Ok("abc"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), Err(AuthError::Missing));
        assert_eq!(extract_bearer_token(&headers("Bearer")), Err(AuthError::Missing));
        assert_eq!(extract_bearer_token(&headers("Bearer    ")), Err(AuthError::Missing));
    }

    #[test]
    fn test_other_schemes_are_rejected() {
        assert!(matches!(
            extract_bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::Malformed(_))
        ));
    }
}
