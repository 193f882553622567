mod check;
mod config;
mod consts;
mod errors;
mod init;
mod lead;
mod logging;
mod mail;
mod server;
mod server_utils;

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, warn};

use config::ServerConfig;
use consts::DEFAULT_CONTENT_PATH;
use logging::init_logging;
use mail::{MailConfig, Mailer, SmtpMailer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Silence all output
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a blank content checklist
    Init {
        #[arg(default_value = DEFAULT_CONTENT_PATH)]
        path: PathBuf,
        /// Overwrite the file if it already exists
        #[arg(long)]
        force: bool,
    },
    /// Report missing or incomplete content
    Check {
        #[arg(default_value = DEFAULT_CONTENT_PATH)]
        path: PathBuf,
        /// Directory of the built site, to verify that asset paths exist
        #[arg(long)]
        site_dir: Option<PathBuf>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Serve the site and relay contact form submissions by email
    Serve {
        /// Address to listen on [default: 0.0.0.0]
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to listen on [env: PORT, default: 5000]
        #[arg(long)]
        port: Option<u16>,
        /// Directory of the built site [env: SITE_DIR, default: site]
        #[arg(long)]
        site_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine, the variables may come from the real environment.
    let dotenv = dotenvy::dotenv();

    init_logging();

    if let Err(err) = &dotenv {
        if !err.not_found() {
            warn!(name: "config", "Failed to load .env: {}", err);
        }
    }

    match cli.command {
        Commands::Init { path, force } => match init::write_starter(&path, force) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(name: "init", "{}", err);
                ExitCode::FAILURE
            }
        },
        Commands::Check {
            path,
            site_dir,
            strict,
        } => check::run_check(&path, site_dir, strict).into(),
        Commands::Serve {
            host,
            port,
            site_dir,
        } => {
            let config = ServerConfig::from_env().with_overrides(host, port, site_dir);

            let mailer = match MailConfig::from_env() {
                Some(mail_config) => Some(Arc::new(SmtpMailer::new(mail_config)) as Arc<dyn Mailer>),
                None => {
                    warn!(
                        name: "mail",
                        "SMTP is not configured (MAIL_SMTP_USER, MAIL_SMTP_PASS, MAIL_TO), contact form submissions will be dropped"
                    );
                    None
                }
            };

            match server::start_server(config, mailer).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!(name: "server", "{}", err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
