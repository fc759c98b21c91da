///! CORS (Cross-Origin Resource Sharing) middleware
///!
///! Adds CORS headers to every response and answers preflight requests
///! without reaching the router.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "authorization, content-type";
const MAX_AGE_SECS: &str = "3600";

/// Origins allowed to call the API
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    any_origin: bool,
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// `"*"` anywhere in the list allows every origin
    pub fn new(allowed_origins: &[String]) -> Self {
        Self {
            any_origin: allowed_origins.iter().any(|o| o == "*"),
            allowed_origins: allowed_origins
                .iter()
                .filter(|o| *o != "*")
                .cloned()
                .collect(),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin is allowed
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        if self.any_origin {
            return Some(HeaderValue::from_static("*"));
        }

        let origin = origin?;
        if self.allowed_origins.iter().any(|o| o == origin) {
            HeaderValue::from_str(origin).ok()
        } else {
            None
        }
    }

    fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        let Some(allow_origin) = self.allow_origin(origin) else {
            return;
        };

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );

        if !self.any_origin {
            headers.insert(header::VARY, HeaderValue::from_static("origin"));
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(&["*".to_string()])
    }
}

/// CORS middleware
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        policy.apply(origin.as_deref(), response.headers_mut());
        response.headers_mut().insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        return response;
    }

    let mut response = next.run(request).await;
    policy.apply(origin.as_deref(), response.headers_mut());
    response
}
