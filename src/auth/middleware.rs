use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};

/// Name of the cookie carrying the access token for browser clients
pub const SESSION_COOKIE: &str = "session";

/// Find the access token in the Authorization header, falling back to the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(header) = headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeaderFormat)?;
        return extract_bearer_token(value).map(str::to_string);
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingAuthHeader)
}

/// JWT authentication middleware
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = token_from_headers(request.headers())?;
    let session = auth_service.validate_session(&token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Admin-only middleware, layered after `jwt_auth_middleware`
pub async fn admin_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let session = request
        .extensions()
        .get::<UserSession>()
        .ok_or(AuthError::InsufficientPermissions)?;

    if session.role != UserRole::Admin {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// The authenticated caller, inserted by `jwt_auth_middleware`
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserSession);

impl std::ops::Deref for AuthUser {
    type Target = UserSession;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserSession>()
            .cloned()
            .map(AuthUser)
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// CORS configuration; a configured origin enables credentialed requests
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, axum::http::header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

/// Sliding-window in-memory rate limiter keyed by client address
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<Mutex<RateLimitStore>>,
    max_requests: usize,
    window: Duration,
}

#[derive(Debug)]
struct RateLimitStore {
    requests: HashMap<String, Vec<Instant>>,
    last_cleanup: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(RateLimitStore {
                requests: HashMap::new(),
                last_cleanup: Instant::now(),
            })),
            max_requests,
            window,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RateLimitStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut store = self.lock();
        let now = Instant::now();

        // Sweep idle clients at most once per window
        if now.duration_since(store.last_cleanup) >= self.window {
            remove_expired(&mut store.requests, now, self.window);
            store.last_cleanup = now;
        }

        let entry = store.requests.entry(key.to_string()).or_default();
        entry.retain(|&time| now.duration_since(time) < self.window);

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drop every client with no request inside the window
    pub fn cleanup_old_entries(&self) {
        let mut store = self.lock();
        let now = Instant::now();
        remove_expired(&mut store.requests, now, self.window);
        store.last_cleanup = now;
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.lock().requests.len()
    }
}

fn remove_expired(requests: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
    requests.retain(|_, times| {
        times.retain(|&time| now.duration_since(time) < window);
        !times.is_empty()
    });
}

/// Client key: first proxy-reported address, then the peer address
fn client_key(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware for credential endpoints
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = client_key(request.headers(), remote_addr);

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!(client = %client_ip, "rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_rate_limiter() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));

        assert!(!limiter.check_rate_limit("client1"));

        assert!(limiter.check_rate_limit("client2"));
    }

    #[test]
    fn test_rate_limiter_forgets_idle_clients() {
        let limiter = RateLimiter::new(3, Duration::from_millis(200));
        for i in 0..100 {
            assert!(limiter.check_rate_limit(&format!("10.0.0.{}", i)));
        }
        assert_eq!(limiter.tracked_clients(), 100);

        std::thread::sleep(Duration::from_millis(250));
        assert!(limiter.check_rate_limit("10.9.9.9"));
        assert_eq!(limiter.tracked_clients(), 1);

        std::thread::sleep(Duration::from_millis(250));
        limiter.cleanup_old_entries();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_client_key_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.7:51234".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.7");
        assert_eq!(client_key(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.5");
    }

    #[test]
    fn test_token_prefers_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert(COOKIE, HeaderValue::from_static("session=cookie-token"));

        assert_eq!(token_from_headers(&headers).unwrap(), "header-token");
    }

    #[test]
    fn test_token_falls_back_to_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=cookie-token"));

        assert_eq!(token_from_headers(&headers).unwrap(), "cookie-token");
    }

    #[test]
    fn test_missing_credentials() {
        let headers = HeaderMap::new();
        assert!(matches!(token_from_headers(&headers), Err(AuthError::MissingAuthHeader)));
    }
}
