//! Completeness checks for a [`SiteContent`] checklist.
//!
//! Checks never fail loading: they produce a [`Report`] listing everything that still needs the owner's attention.
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::content::SiteContent;

pub const SERVICES_RANGE: RangeInclusive<usize> = 3..=6;
pub const PROCESS_RANGE: RangeInclusive<usize> = 3..=5;
pub const MIN_TESTIMONIALS: usize = 3;

const PLACEHOLDER_WORDS: [&str; 4] = ["todo", "tbd", "xxx", "fixme"];
const PLACEHOLDER_PHRASES: [&str; 3] = ["lorem ipsum", "example.com", "your company"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Dotted path of the field, e.g. `gallery[2].alt_text`.
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
    }

    /// A checklist is complete when nothing is left at [`Severity::Error`].
    pub fn is_complete(&self) -> bool {
        self.errors().next().is_none()
    }

    #[cfg(test)]
    fn has_finding(&self, field: &str) -> bool {
        self.findings.iter().any(|finding| finding.field == field)
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, field, message);
    }

    fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, field, message);
    }

    fn push(&mut self, severity: Severity, field: impl Into<String>, message: impl Into<String>) {
        self.findings.push(Finding {
            severity,
            field: field.into(),
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// When set, local asset paths are resolved against this directory and must exist.
    pub site_dir: Option<PathBuf>,
}

/// Runs every checklist rule against `content`.
pub fn check(content: &SiteContent, options: &CheckOptions) -> Report {
    let mut report = Report::default();

    check_required(content, &mut report);
    check_cardinality(content, &mut report);
    check_entries(content, &mut report);
    check_placeholders(content, &mut report);

    if let Some(site_dir) = &options.site_dir {
        check_assets(content, site_dir, &mut report);
    }

    log::debug!(
        target: "checklist",
        "Checked content: {} error(s), {} warning(s)",
        report.errors().count(),
        report.warnings().count()
    );

    report
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_required(content: &SiteContent, report: &mut Report) {
    let required = [
        ("company.name", content.company.name.as_str()),
        ("company.tagline", content.company.tagline.as_str()),
        ("contact.email", content.contact.email.as_str()),
        ("hero.summary", content.hero.summary.as_str()),
        ("cta.primary", content.cta.primary.as_str()),
        ("assets.logo", content.assets.logo.as_str()),
    ];

    for (field, value) in required {
        if is_blank(value) {
            report.error(field, "is required");
        }
    }

    if !is_blank(&content.contact.email) && !is_plausible_email(&content.contact.email) {
        report.error("contact.email", "is not a valid email address");
    }

    if content.contact.service_areas.iter().all(|area| is_blank(area)) {
        report.warning("contact.service_areas", "list at least one service area");
    }

    if content.hero.benefits.iter().all(|benefit| is_blank(benefit)) {
        report.warning("hero.benefits", "list at least one benefit");
    }

    if content.compliance.iter().all(|text| is_blank(text)) {
        report.warning("compliance", "add a licensing disclaimer");
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn check_cardinality(content: &SiteContent, report: &mut Report) {
    let services = content.services.len();
    if !SERVICES_RANGE.contains(&services) {
        report.error(
            "services",
            format!(
                "expected between {} and {} services, found {}",
                SERVICES_RANGE.start(),
                SERVICES_RANGE.end(),
                services
            ),
        );
    }

    let testimonials = content.testimonials.len();
    if testimonials < MIN_TESTIMONIALS {
        report.error(
            "testimonials",
            format!("expected at least {MIN_TESTIMONIALS} testimonials, found {testimonials}"),
        );
    }

    let process = content.process.len();
    if !PROCESS_RANGE.contains(&process) {
        report.error(
            "process",
            format!(
                "expected between {} and {} process steps, found {}",
                PROCESS_RANGE.start(),
                PROCESS_RANGE.end(),
                process
            ),
        );
    }
}

fn check_entries(content: &SiteContent, report: &mut Report) {
    for (i, service) in content.services.iter().enumerate() {
        if is_blank(&service.title) {
            report.error(format!("services[{i}].title"), "is required");
        }
    }

    for (i, entry) in content.gallery.iter().enumerate() {
        let fields = [
            ("title", &entry.title),
            ("location", &entry.location),
            ("scope", &entry.scope),
            ("duration", &entry.duration),
            ("date", &entry.date),
            ("image", &entry.image),
            ("alt_text", &entry.alt_text),
        ];

        for (name, value) in fields {
            if is_blank(value) {
                report.error(format!("gallery[{i}].{name}"), "is required");
            }
        }
    }

    for (i, testimonial) in content.testimonials.iter().enumerate() {
        if is_blank(&testimonial.quote) {
            report.error(format!("testimonials[{i}].quote"), "is required");
        }
        if is_blank(&testimonial.name) {
            report.error(format!("testimonials[{i}].name"), "is required");
        }
    }

    for (i, step) in content.process.iter().enumerate() {
        if is_blank(step) {
            report.error(format!("process[{i}]"), "is empty");
        }
    }
}

fn text_fields(content: &SiteContent) -> Vec<(String, &str)> {
    let mut fields: Vec<(String, &str)> = vec![
        ("company.name".into(), content.company.name.as_str()),
        ("company.owner".into(), content.company.owner.as_str()),
        ("company.tagline".into(), content.company.tagline.as_str()),
        ("company.licensing".into(), content.company.licensing.as_str()),
        ("company.insurance".into(), content.company.insurance.as_str()),
        ("contact.email".into(), content.contact.email.as_str()),
        ("contact.hours".into(), content.contact.hours.as_str()),
        ("hero.summary".into(), content.hero.summary.as_str()),
        ("cta.primary".into(), content.cta.primary.as_str()),
        ("cta.secondary".into(), content.cta.secondary.as_str()),
        ("cta.encouragement".into(), content.cta.encouragement.as_str()),
    ];

    if let Some(phone) = &content.contact.phone {
        fields.push(("contact.phone".into(), phone));
    }

    let lists = [
        ("contact.service_areas", &content.contact.service_areas),
        ("hero.benefits", &content.hero.benefits),
        ("process", &content.process),
        ("compliance", &content.compliance),
    ];
    for (name, list) in lists {
        for (i, value) in list.iter().enumerate() {
            fields.push((format!("{name}[{i}]"), value));
        }
    }

    for (i, service) in content.services.iter().enumerate() {
        fields.push((format!("services[{i}].title"), &service.title));
        fields.push((format!("services[{i}].qualifier"), &service.qualifier));
    }

    for (i, entry) in content.gallery.iter().enumerate() {
        fields.push((format!("gallery[{i}].title"), &entry.title));
        fields.push((format!("gallery[{i}].location"), &entry.location));
        fields.push((format!("gallery[{i}].scope"), &entry.scope));
        fields.push((format!("gallery[{i}].alt_text"), &entry.alt_text));
    }

    for (i, testimonial) in content.testimonials.iter().enumerate() {
        fields.push((format!("testimonials[{i}].quote"), &testimonial.quote));
        fields.push((format!("testimonials[{i}].name"), &testimonial.name));
    }

    fields
}

fn looks_like_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();

    if PLACEHOLDER_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
    {
        return true;
    }

    if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| PLACEHOLDER_WORDS.contains(&word))
    {
        return true;
    }

    // Bracketed hints such as "[Company Name]".
    match (lower.find('['), lower.rfind(']')) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    }
}

fn check_placeholders(content: &SiteContent, report: &mut Report) {
    for (field, value) in text_fields(content) {
        if looks_like_placeholder(value) {
            report.warning(field, format!("looks like placeholder text: {:?}", value.trim()));
        }
    }
}

fn is_local_path(path: &str) -> bool {
    !(path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("//")
        || path.starts_with("data:"))
}

fn check_assets(content: &SiteContent, site_dir: &Path, report: &mut Report) {
    let mut check_path = |field: String, path: &str, severity: Severity| {
        let path = path.trim();
        if path.is_empty() || !is_local_path(path) {
            return;
        }

        let resolved = site_dir.join(path.trim_start_matches('/'));
        if !resolved.is_file() {
            report.push(
                severity,
                field,
                format!("asset not found: {}", resolved.display()),
            );
        }
    };

    check_path("assets.logo".into(), &content.assets.logo, Severity::Error);
    check_path("assets.favicon".into(), &content.assets.favicon, Severity::Warning);
    check_path(
        "assets.social_image".into(),
        &content.assets.social_image,
        Severity::Warning,
    );

    for (i, entry) in content.gallery.iter().enumerate() {
        check_path(format!("gallery[{i}].image"), &entry.image, Severity::Error);
    }
}
