//! Relays leads to the owner's inbox over SMTP.
use futures::future::BoxFuture;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Mailbox,
        header::{ContentType, Header, HeaderName, HeaderValue},
    },
    transport::smtp::authentication::Credentials,
};
use tracing::{info, warn};

use crate::config::{env_value, process_env};
use crate::consts::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, FORM_ENDPOINT, SMTP_TIMEOUT};
use crate::errors::MailError;
use crate::lead::Lead;

/// Port on which the relay expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub to_addrs: Vec<String>,
    pub from_addr: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("to_addrs", &self.to_addrs)
            .field("from_addr", &self.from_addr)
            .finish()
    }
}

impl MailConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(process_env)
    }

    /// Resolves the `MAIL_*` variables. Returns `None` when anything required is missing or the port is not a number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = env_value(&lookup, "MAIL_SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = match env_value(&lookup, "MAIL_SMTP_PORT") {
            Some(port) => port.trim().parse().ok()?,
            None => DEFAULT_SMTP_PORT,
        };
        let user = env_value(&lookup, "MAIL_SMTP_USER")?;
        let password = env_value(&lookup, "MAIL_SMTP_PASS")?;
        let to_addrs = parse_addresses(env_value(&lookup, "MAIL_TO").as_deref());
        let from_addr = env_value(&lookup, "MAIL_FROM").unwrap_or_else(|| user.clone());

        if to_addrs.is_empty() {
            return None;
        }

        Some(Self {
            host,
            port,
            user,
            password,
            to_addrs,
            from_addr,
        })
    }
}

/// Splits a comma-separated recipient list, dropping blanks.
pub fn parse_addresses(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

/// Something that can deliver a lead. The server only talks to this trait.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<(), MailError>>;
}

pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = if self.config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        };

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

impl Mailer for SmtpMailer {
    fn send<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            let message = build_message(&self.config, lead)?;
            self.transport()?.send(message).await?;

            info!(name: "mail", "Lead email sent to {}", self.config.to_addrs.join(", "));
            Ok(())
        })
    }
}

#[derive(Clone)]
struct FormEndpoint(String);

impl Header for FormEndpoint {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Form-Endpoint")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

pub fn lead_body(lead: &Lead) -> String {
    format!(
        "A new lead was submitted from the website:\n\nName:   {}\nEmail:  {}\nPhone:  {}\n\nMessage:\n{}",
        lead.name,
        lead.email,
        lead.phone.as_deref().unwrap_or("-"),
        lead.message
    )
}

/// Builds the notification email. Replies go straight to the lead when their address parses.
///
/// A malformed lead address only drops `Reply-To`: the raw value is still in the body.
pub fn build_message(config: &MailConfig, lead: &Lead) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(&config.from_addr)?)
        .subject(format!("New estimate request from {}", lead.name))
        .header(FormEndpoint(FORM_ENDPOINT.to_string()))
        .header(ContentType::TEXT_PLAIN);

    match mailbox(&lead.email) {
        Ok(reply_to) => builder = builder.reply_to(reply_to),
        Err(err) => warn!(name: "mail", "Sending lead without Reply-To: {}", err),
    }

    for to in &config.to_addrs {
        builder = builder.to(mailbox(to)?);
    }

    Ok(builder.body(lead_body(lead))?)
}
