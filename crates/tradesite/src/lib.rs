//! Content checklist for a small contractor website.
//!
//! The owner fills in a [`SiteContent`] file (company profile, contact info, services, gallery, testimonials...)
//! and [`check()`] reports what is still missing before the site can be published.
//!
//! ## Example
//! ```rs
//! use tradesite::{check, CheckOptions, SiteContent};
//!
//! fn main() -> Result<(), tradesite::errors::ContentError> {
//!   let content = SiteContent::load("content.yaml")?;
//!   let report = check(&content, &CheckOptions::default());
//!   for finding in &report.findings {
//!     println!("{}: {} {}", finding.severity, finding.field, finding.message);
//!   }
//!   Ok(())
//! }
//! ```
pub mod checklist;
pub mod content;
pub mod errors;

pub use checklist::{CheckOptions, Finding, Report, Severity, check};
pub use content::{SiteContent, starter_template};
