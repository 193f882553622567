use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;

use axum::{
    Form,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{HeaderMap, StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, info, warn};

use super::AppState;
use crate::lead::{ContactForm, Lead};

const THANKS_PATH: &str = "/thanks";

/// Address of the client: the first `X-Forwarded-For` entry when behind a proxy, else the peer address.
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}

pub fn client_ip(headers: &HeaderMap, peer: Option<std::net::IpAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (forwarded, peer) {
        (Some(forwarded), _) => forwarded.to_string(),
        (None, Some(peer)) => peer.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Basic CSRF guard: when the browser says where the post comes from, it has to be this site.
///
/// Clients that send neither `Origin` nor `Referer` are let through, they still go through the rate limiter.
/// Empty values count as absent.
pub fn is_same_origin(headers: &HeaderMap) -> bool {
    let present = |name: header::HeaderName| headers.get(name).filter(|value| !value.is_empty());
    let claimed = present(header::ORIGIN).or_else(|| present(header::REFERER));

    let Some(claimed) = claimed else {
        return true;
    };

    let Some(host) = headers.get(header::HOST).and_then(|host| host.to_str().ok()) else {
        return false;
    };

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|proto| proto.to_str().ok())
        .and_then(|proto| proto.split(',').next())
        .map(str::trim)
        .unwrap_or("http");

    let Some(claimed) = claimed
        .to_str()
        .ok()
        .and_then(|claimed| claimed.parse::<Uri>().ok())
    else {
        return false;
    };

    match (claimed.scheme_str(), claimed.authority()) {
        (Some(claimed_scheme), Some(claimed_authority)) => {
            claimed_scheme.eq_ignore_ascii_case(scheme)
                && claimed_authority.as_str().eq_ignore_ascii_case(host)
        }
        _ => false,
    }
}

pub async fn handle_send(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Response {
    if form.is_honeypot_filled() {
        info!(name: "form", "Honeypot triggered; dropping submission");
        return Redirect::to(THANKS_PATH).into_response();
    }

    if !is_same_origin(&headers) {
        warn!(name: "form", "Rejected submission: origin mismatch");
        return (StatusCode::BAD_REQUEST, "Invalid origin").into_response();
    }

    if state.limiter.is_limited(&ip) {
        warn!(name: "form", "Rate limit exceeded for {}", ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many submissions, try again later",
        )
            .into_response();
    }

    let lead = match Lead::from_form(&form) {
        Ok(lead) => lead,
        Err(err) => {
            warn!(name: "form", "Invalid submission: {}", err);
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    match &state.mailer {
        Some(mailer) => {
            // Failures are only logged, the visitor is redirected either way.
            if let Err(err) = mailer.send(&lead).await {
                error!(name: "mail", "Failed to send email: {}", err);
            }
        }
        None => {
            if !state.mail_missing_logged.swap(true, Ordering::Relaxed) {
                error!(name: "mail", "Email not sent: missing or invalid SMTP configuration");
            }
        }
    }

    Redirect::to(THANKS_PATH).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn test_client_ip() {
        let peer = Some("192.168.1.9".parse().unwrap());

        assert_eq!(client_ip(&headers(&[]), peer), "192.168.1.9");
        assert_eq!(client_ip(&headers(&[]), None), "unknown");
        assert_eq!(
            client_ip(
                &headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]),
                peer
            ),
            "203.0.113.7"
        );
    }

    #[test]
    fn test_same_origin_without_headers() {
        assert!(is_same_origin(&headers(&[("host", "ridgeline.test")])));
    }

    #[test]
    fn test_same_origin() {
        assert!(is_same_origin(&headers(&[
            ("host", "ridgeline.test:5000"),
            ("origin", "http://ridgeline.test:5000"),
        ])));
        assert!(is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("referer", "http://Ridgeline.test/contact?from=hero"),
        ])));
        assert!(is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("x-forwarded-proto", "https"),
            ("origin", "https://ridgeline.test"),
        ])));
    }

    #[test]
    fn test_empty_origin_falls_back_to_referer() {
        assert!(is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", ""),
            ("referer", "http://ridgeline.test/contact"),
        ])));
        assert!(!is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", ""),
            ("referer", "http://spam.test/contact"),
        ])));
        assert!(is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", ""),
            ("referer", ""),
        ])));
    }

    #[test]
    fn test_cross_origin() {
        assert!(!is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", "http://ridgeline.test.evil.test"),
        ])));
        assert!(!is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", "https://ridgeline.test"),
        ])));
        assert!(!is_same_origin(&headers(&[
            ("host", "ridgeline.test"),
            ("origin", "null"),
        ])));
        assert!(!is_same_origin(&headers(&[(
            "origin",
            "http://ridgeline.test"
        )])));
    }
}
