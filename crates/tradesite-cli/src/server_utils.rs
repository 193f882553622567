use axum::{body::Body, http::Uri, response::Response};
use colored::Colorize;
use local_ip_address::local_ip;
use std::{net::SocketAddr, time::Duration};
use tower_http::trace::OnResponse;
use tracing::{Span, info};

use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time};

pub fn log_server_start(start_time: std::time::Instant, addr: SocketAddr, site_dir: &str) {
    let exposed = !addr.ip().is_loopback();

    info!(name: "SKIP_FORMAT", "");
    let elapsed_time = format_elapsed_time(
        Ok(start_time.elapsed()),
        &FormatElapsedTimeOptions::startup(),
    )
    .unwrap_or_else(|_| "?".dimmed());
    info!(name: "SKIP_FORMAT", "{} {}", "tradesite".bold().bright_green(), format!("server started in {}", elapsed_time));
    info!(name: "SKIP_FORMAT", "");

    let port = addr.port();
    let url = format!("\x1b]8;;http://localhost:{port}\x1b\\http://localhost:{port}\x1b]8;;\x1b\\")
        .bold()
        .underline()
        .bright_blue();
    let network_url = match (exposed, local_ip()) {
        (true, Ok(local_ip)) => {
            format!("\x1b]8;;http://{local_ip}:{port}\x1b\\http://{local_ip}:{port}\x1b]8;;\x1b\\")
                .bold()
                .underline()
                .bright_magenta()
        }
        (true, Err(_)) => format!("listening on {addr}").dimmed(),
        (false, _) => "Use --host 0.0.0.0 to expose the server to your network".dimmed(),
    };
    info!(name: "SKIP_FORMAT", "  {}    {}", "Local".bold(), url);
    info!(name: "SKIP_FORMAT", "  {}  {}", "Network".bold(), network_url);
    info!(name: "SKIP_FORMAT", "  {}    {}", "Files".bold(), site_dir.dimmed());
    info!(name: "SKIP_FORMAT", "");

    info!(name: "server", "{}", "waiting for requests...".dimmed());
}

#[derive(Clone, Debug)]
pub struct CustomOnResponse;

impl OnResponse<Body> for CustomOnResponse {
    fn on_response(self, response: &Response<Body>, latency: Duration, _span: &Span) {
        let status = response.status();

        if status.is_informational() {
            return;
        }

        let status = if status.is_server_error() {
            status.to_string().red()
        } else if status.is_client_error() {
            status.to_string().yellow()
        } else {
            status.to_string().green()
        };

        // The request URI is copied onto the response by the headers middleware.
        let uri = response
            .extensions()
            .get::<Uri>()
            .map(|uri| uri.to_string())
            .unwrap_or_default()
            .bold();

        let latency = format_elapsed_time(Ok(latency), &FormatElapsedTimeOptions::default())
            .unwrap_or_else(|_| "?".dimmed());

        info!(name: "", "{} {} {}", status, uri, latency);
    }
}
