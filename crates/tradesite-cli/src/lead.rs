//! Contact form submissions ("leads") and the cleaning applied before they are mailed.
use serde::Deserialize;

use crate::consts::{HEADER_FIELD_LIMIT, MESSAGE_LIMIT};
use crate::errors::FormError;

/// Raw `application/x-www-form-urlencoded` body posted to `/send`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Honeypot, hidden from humans with CSS. Anything in it means a bot filled the form.
    pub company: String,
}

impl ContactForm {
    pub fn is_honeypot_filled(&self) -> bool {
        match clean_header_value(&self.company, HEADER_FIELD_LIMIT, "company") {
            Ok(company) => !company.is_empty(),
            // Nobody types 1000 characters into a field they cannot see.
            Err(_) => true,
        }
    }
}

/// A cleaned, validated submission, ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl Lead {
    pub fn from_form(form: &ContactForm) -> Result<Self, FormError> {
        let name = clean_header_value(&form.name, HEADER_FIELD_LIMIT, "name")?;
        let email = clean_header_value(&form.email, HEADER_FIELD_LIMIT, "email")?;
        let phone = clean_header_value(&form.phone, HEADER_FIELD_LIMIT, "phone")?;
        let message = clean_message(&form.message, MESSAGE_LIMIT)?;

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(FormError::MissingFields);
        }

        Ok(Self {
            name,
            email,
            phone: (!phone.is_empty()).then_some(phone),
            message,
        })
    }
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

fn ensure_length(raw: &str, limit: usize, field: &'static str) -> Result<(), FormError> {
    if raw.chars().count() > limit * 4 {
        return Err(FormError::TooLong { field });
    }
    Ok(())
}

/// Cleans a value that ends up in an email header: no line breaks, trimmed, at most `limit` characters.
///
/// Values longer than four times the limit are rejected outright rather than truncated.
pub fn clean_header_value(raw: &str, limit: usize, field: &'static str) -> Result<String, FormError> {
    ensure_length(raw, limit, field)?;

    let cleaned = raw.replace(['\r', '\n'], " ");
    Ok(truncate_chars(cleaned.trim(), limit))
}

/// Cleans the free-text message body: line endings normalised to `\n`, trimmed, at most `limit` characters.
pub fn clean_message(raw: &str, limit: usize) -> Result<String, FormError> {
    ensure_length(raw, limit, "message")?;

    let cleaned = raw.replace("\r\n", "\n").replace('\r', "\n");
    Ok(truncate_chars(cleaned.trim(), limit))
}
