use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::post,
};
use tokio::{fs, net::TcpListener, signal};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{Level, debug, warn};

mod headers;
mod rate_limit;
mod send;

pub use rate_limit::RateLimiter;

use crate::config::ServerConfig;
use crate::consts::MAX_FORM_BYTES;
use crate::errors::ServerError;
use crate::mail::Mailer;
use crate::server_utils::{CustomOnResponse, log_server_start};

#[derive(Clone)]
pub struct AppState {
    pub mailer: Option<Arc<dyn Mailer>>,
    pub limiter: Arc<RateLimiter>,
    /// Set once the missing mail configuration has been reported, so it is logged only once.
    pub mail_missing_logged: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, limiter: RateLimiter) -> Self {
        Self {
            mailer,
            limiter: Arc::new(limiter),
            mail_missing_logged: Arc::new(AtomicBool::new(false)),
        }
    }
}

async fn handle_404(site_dir: PathBuf) -> impl IntoResponse {
    let content = match fs::read_to_string(site_dir.join("404.html")).await {
        Ok(custom_content) => custom_content,
        Err(_) => include_str!("./server/404.html").to_string(),
    };

    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        content,
    )
}

/// Builds the site router: `/send` and `/thanks`, every other path served from `site_dir`.
pub fn router(state: AppState, site_dir: &Path) -> Router {
    let not_found_dir = site_dir.to_path_buf();
    let not_found = (move || handle_404(not_found_dir.clone())).into_service();
    let serve_dir = ServeDir::new(site_dir).not_found_service(not_found);

    Router::new()
        .route("/send", post(send::handle_send))
        .route_service("/thanks", ServeFile::new(site_dir.join("thanks.html")))
        .fallback_service(serve_dir)
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(middleware::from_fn(headers::reject_hidden_paths))
        .layer(middleware::from_fn(headers::security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(CustomOnResponse),
        )
        .with_state(state)
}

pub async fn start_server(config: ServerConfig, mailer: Option<Arc<dyn Mailer>>) -> Result<(), ServerError> {
    let start_time = Instant::now();

    if !config.site_dir.join("index.html").is_file() {
        warn!(
            name: "server",
            "No index.html in {}, the home page will be a 404",
            config.site_dir.display()
        );
    }

    let limiter = RateLimiter::new(config.max_submissions_per_hour, config.rate_limit_window);
    let router = router(AppState::new(mailer, limiter), &config.site_dir);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;

    debug!("listening on {}", local_addr);

    log_server_start(
        start_time,
        local_addr,
        &config.site_dir.display().to_string(),
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(name: "server", "Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(name: "server", "Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MailError;
    use crate::lead::Lead;
    use axum::{
        body::Body,
        http::{Request, Response},
    };
    use futures::future::BoxFuture;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Lead>>,
    }

    impl Mailer for RecordingMailer {
        fn send<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<(), MailError>> {
            Box::pin(async move {
                self.sent.lock().unwrap().push(lead.clone());
                Ok(())
            })
        }
    }

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send<'a>(&'a self, _lead: &'a Lead) -> BoxFuture<'a, Result<(), MailError>> {
            Box::pin(async move {
                Err(MailError::Address {
                    address: "nowhere".to_string(),
                    source: "nowhere".parse::<lettre::Address>().unwrap_err(),
                })
            })
        }
    }

    fn site_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Ridgeline Builders</h1>").unwrap();
        std::fs::write(dir.path().join("thanks.html"), "<h1>Thanks!</h1>").unwrap();
        std::fs::write(dir.path().join(".env"), "MAIL_SMTP_PASS=hunter2").unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/logo.svg"), "<svg/>").unwrap();
        dir
    }

    fn app(dir: &Path, mailer: Option<Arc<dyn Mailer>>, max_hits: usize) -> Router {
        let limiter = RateLimiter::new(max_hits, Duration::from_secs(3600));
        router(AppState::new(mailer, limiter), dir)
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/send")
            .header(header::HOST, "ridgeline.test")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    const VALID_FORM: &str = "name=Jane+Doe&email=jane%40home.test&phone=&message=Need+a+new+deck";

    #[tokio::test]
    async fn test_send_relays_lead() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 5);

        let response = app.oneshot(form_post(VALID_FORM)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/thanks");

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "Jane Doe");
        assert_eq!(sent[0].email, "jane@home.test");
        assert_eq!(sent[0].phone, None);
    }

    #[tokio::test]
    async fn test_honeypot_drops_submission() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 5);

        let body = format!("{VALID_FORM}&company=Acme+SEO");
        let response = app.oneshot(form_post(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_rejected() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 5);

        let mut request = form_post(VALID_FORM);
        request.headers_mut().insert(
            header::ORIGIN,
            "https://spam.test".parse().unwrap(),
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_origin_accepted() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let mut request = form_post(VALID_FORM);
        request.headers_mut().insert(
            header::ORIGIN,
            "http://ridgeline.test".parse().unwrap(),
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 2);

        for _ in 0..2 {
            let response = app.clone().oneshot(form_post(VALID_FORM)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }

        let response = app.clone().oneshot(form_post(VALID_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);

        // A different client is unaffected
        let mut request = form_post(VALID_FORM);
        request
            .headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_rejected_posts_do_not_spend_rate_limit() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 1);

        let body = format!("{VALID_FORM}&company=Acme+SEO");
        let response = app.clone().oneshot(form_post(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let mut request = form_post(VALID_FORM);
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://spam.test".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(form_post(VALID_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);

        let response = app.oneshot(form_post(VALID_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let dir = site_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(dir.path(), Some(mailer.clone()), 5);

        let response = app
            .oneshot(form_post("name=Jane&email=&message=Hi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("Missing required fields"));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_field_rejected() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let body = format!("name={}&email=jane%40home.test&message=Hi", "a".repeat(1100));
        let response = app.oneshot(form_post(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let body = format!("{VALID_FORM}&padding={}", "a".repeat(MAX_FORM_BYTES));
        let response = app.oneshot(form_post(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_mail_failure_still_redirects() {
        let dir = site_dir();
        let app = app(dir.path(), Some(Arc::new(FailingMailer)), 5);

        let response = app.oneshot(form_post(VALID_FORM)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/thanks");
    }

    #[tokio::test]
    async fn test_missing_mail_config_logged_once() {
        let dir = site_dir();
        let limiter = RateLimiter::new(5, Duration::from_secs(3600));
        let state = AppState::new(None, limiter);
        let flag = state.mail_missing_logged.clone();
        let app = router(state, dir.path());

        let response = app.oneshot(form_post(VALID_FORM)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(flag.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_serves_static_pages() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let response = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Ridgeline Builders"));

        let response = app.oneshot(get("/thanks")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Thanks!"));
    }

    #[tokio::test]
    async fn test_security_headers() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let response = app.clone().oneshot(get("/")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("referrer-policy").unwrap(), "same-origin");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert!(headers.contains_key("permissions-policy"));
        assert!(
            headers
                .get("content-security-policy")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("form-action 'self'")
        );
        assert_ne!(
            headers.get(header::CACHE_CONTROL).map(|v| v.to_str().unwrap()),
            Some("public, max-age=86400, immutable")
        );

        let response = app.clone().oneshot(form_post(VALID_FORM)).await.unwrap();
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );

        let response = app.oneshot(get("/assets/logo.svg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=86400, immutable"
        );
    }

    #[tokio::test]
    async fn test_hidden_files_not_served() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let response = app.oneshot(get("/.env")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!body_string(response).await.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_not_found_uses_site_page() {
        let dir = site_dir();
        let app = app(dir.path(), None, 5);

        let response = app.clone().oneshot(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Page not found"));

        std::fs::write(dir.path().join("404.html"), "<h1>Nothing here</h1>").unwrap();
        let response = app.oneshot(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Nothing here"));
    }
}
