use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SITE_DIR: &str = "site";
pub const DEFAULT_CONTENT_PATH: &str = "content.yaml";

/// Form posts are tiny, anything larger is rejected with 413.
pub const MAX_FORM_BYTES: usize = 16 * 1024;
pub const HEADER_FIELD_LIMIT: usize = 255;
pub const MESSAGE_LIMIT: usize = 5000;

pub const DEFAULT_MAX_SUBMISSIONS_PER_HOUR: usize = 5;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(20);
pub const FORM_ENDPOINT: &str = "tradesite/send";
