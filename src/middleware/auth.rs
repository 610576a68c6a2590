use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::config;
use crate::error::ApiError;

/// Authenticated user context extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Bearer-token authentication middleware. Rejects the request with 401 before
/// the wrapped handler runs; on success injects [`AuthUser`] as an extension.
pub async fn bearer_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let token = match extract_bearer_token(&headers) {
        Some(token) => token,
        None => return Err(ApiError::unauthorized("Missing Authorization header")),
    };

    let secret = &config::config().security.jwt_secret;
    let claims = validate_jwt(token, secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// Returns None for missing, non-Bearer, or empty tokens.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn rejects_empty_token() {
        let headers = headers_with("Bearer   ");
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
