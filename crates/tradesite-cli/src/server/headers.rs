use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

const PERMISSIONS_POLICY: &str = "accelerometer=(), camera=(), geolocation=(), gyroscope=(), magnetometer=(), microphone=(), payment=(), usb=()";

const CONTENT_SECURITY_POLICY: &str = concat!(
    "default-src 'self'; ",
    "img-src 'self' data:; ",
    "style-src 'self' 'unsafe-inline'; ",
    "script-src 'self' 'unsafe-inline' https://plausible.io https://www.googletagmanager.com; ",
    "connect-src 'self' https://plausible.io https://www.google-analytics.com https://region1.google-analytics.com; ",
    "form-action 'self';"
);

const LONG_CACHE: &str = "public, max-age=86400, immutable";

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::REFERRER_POLICY, "same-origin"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (
        HeaderName::from_static("permissions-policy"),
        PERMISSIONS_POLICY,
    ),
    (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
];

fn is_long_cached(path: &str) -> bool {
    path.starts_with("/assets/") || path.starts_with("/style.css")
}

/// Adds the security headers handlers did not set themselves, and long-lived caching for static assets.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let uri = req.uri().clone();
    let mut res = next.run(req).await;

    let headers = res.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    if is_long_cached(uri.path()) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));
    }

    // Picked up by the request logger.
    res.extensions_mut().insert(uri);
    res
}

fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
    })
}

/// Never serve dotfiles (`.env`, `.git/`) from the site directory.
pub async fn reject_hidden_paths(req: Request, next: Next) -> Response {
    if is_hidden_path(req.uri().path()) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    next.run(req).await
}
