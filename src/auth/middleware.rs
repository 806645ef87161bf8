// Authentication middleware for protected routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, models::CurrentUser, service::AuthService};

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// Any other shape (missing header, other scheme, extra parts) yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}

/// Collapse a verification failure into the response the client sees
///
/// Server-side failures keep their 500; everything else becomes the same
/// generic 401.
fn reject(err: AuthError, endpoint: &str) -> AuthError {
    if err.is_internal() {
        return err;
    }

    match err {
        AuthError::Forbidden => warn!(
            "Authorization failed: authenticated user is not an admin, endpoint={}",
            endpoint
        ),
        other => warn!(
            "Authentication failed: reason={}, endpoint={}",
            other, endpoint
        ),
    }
    AuthError::Unauthorized
}

/// Middleware for routes that need any authenticated user
///
/// On success the resolved user is stored as a `CurrentUser` request
/// extension for the handler.
pub async fn require_auth(
    State(service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or_else(|| reject(AuthError::MissingToken, &endpoint))?;

    let user = service
        .verify(&token)
        .await
        .map_err(|e| reject(e, &endpoint))?;

    debug!("Authentication successful: user_id={}, endpoint={}", user.id, endpoint);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Middleware for routes restricted to admins
pub async fn require_admin(
    State(service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or_else(|| reject(AuthError::MissingToken, &endpoint))?;

    let user = service
        .verify_admin(&token)
        .await
        .map_err(|e| reject(e, &endpoint))?;

    debug!("Admin authorization successful: user_id={}, endpoint={}", user.id, endpoint);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::service::test_support::{harness, Harness};
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn whoami(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
        user.email
    }

    fn protected_app(h: &Harness) -> Router {
        let authenticated = Router::new()
            .route("/me", get(whoami))
            .route_layer(from_fn_with_state(h.service.clone(), require_auth));
        let admin = Router::new()
            .route("/admin", get(whoami))
            .route_layer(from_fn_with_state(h.service.clone(), require_admin));

        authenticated.merge(admin).with_state(h.service.clone())
    }

    fn request(uri: &str, authorization: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn login_token(h: &Harness, email: &str) -> String {
        h.service.register(email, "secret123", "Test").await.unwrap();
        h.service.login(email, "secret123").await.unwrap().token
    }

    #[test]
    fn test_bearer_token_accepts_bearer_scheme() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_shapes() {
        for value in [
            "",
            "Bearer",
            "Bearer ",
            "abc.def.ghi",
            "Basic dXNlcjpwYXNz",
            "Token abc",
            "Bearer abc def",
        ] {
            assert_eq!(bearer_token(&headers_with(value)), None, "header {:?}", value);
        }
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let h = harness();
        let token = login_token(&h, "alice@example.com").await;

        let response = protected_app(&h)
            .oneshot(request("/me", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "alice@example.com");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        let h = harness();
        let token = login_token(&h, "alice@example.com").await;

        for authorization in [None, Some(token.as_str()), Some("Basic dXNlcjpwYXNz")] {
            let response = protected_app(&h)
                .oneshot(request("/me", authorization))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let h = harness();

        let response = protected_app(&h)
            .oneshot(request("/me", Some("Bearer not.a.token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_route_rejects_user_like_a_bad_token() {
        let h = harness();
        let token = login_token(&h, "alice@example.com").await;

        let as_user = protected_app(&h)
            .oneshot(request("/admin", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        let as_nobody = protected_app(&h)
            .oneshot(request("/admin", Some("Bearer not.a.token")))
            .await
            .unwrap();

        assert_eq!(as_user.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(as_nobody.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(as_user).await, body_text(as_nobody).await);
    }

    #[tokio::test]
    async fn test_admin_route_accepts_admin() {
        let h = harness();
        let user = h
            .service
            .register("root@example.com", "secret123", "Root")
            .await
            .unwrap();
        h.service.grant_admin(user.id).await.unwrap();
        let token = h.service.login("root@example.com", "secret123").await.unwrap().token;

        let response = protected_app(&h)
            .oneshot(request("/admin", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "root@example.com");
    }

    #[tokio::test]
    async fn test_store_outage_is_not_reported_as_unauthorized() {
        let h = harness();
        let token = login_token(&h, "alice@example.com").await;
        h.users.go_offline();

        let response = protected_app(&h)
            .oneshot(request("/me", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
