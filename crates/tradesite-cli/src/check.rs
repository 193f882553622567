use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use tracing::{error, info};
use tradesite::{CheckOptions, Report, Severity, SiteContent, check};

/// Outcome of `tradesite check`, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Complete,
    Incomplete,
    Unreadable,
}

impl From<CheckStatus> for ExitCode {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Complete => ExitCode::SUCCESS,
            CheckStatus::Incomplete => ExitCode::from(1),
            CheckStatus::Unreadable => ExitCode::from(2),
        }
    }
}

pub fn status_for(report: &Report, strict: bool) -> CheckStatus {
    let has_warnings = report.warnings().next().is_some();

    if !report.is_complete() || (strict && has_warnings) {
        CheckStatus::Incomplete
    } else {
        CheckStatus::Complete
    }
}

pub fn run_check(path: &Path, site_dir: Option<PathBuf>, strict: bool) -> CheckStatus {
    let content = match SiteContent::load(path) {
        Ok(content) => content,
        Err(err) => {
            error!(name: "check", "{}", err);
            return CheckStatus::Unreadable;
        }
    };

    let report = check(&content, &CheckOptions { site_dir });
    print_report(path, &report);

    status_for(&report, strict)
}

fn print_report(path: &Path, report: &Report) {
    info!(name: "SKIP_FORMAT", "");

    let mut findings: Vec<_> = report.findings.iter().collect();
    // Errors first, then in checklist order.
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    for finding in findings {
        let label = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warn ".yellow().bold(),
        };
        info!(name: "SKIP_FORMAT", "  {} {} {}", label, finding.field.bold(), finding.message.dimmed());
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();

    if report.findings.is_empty() {
        info!(name: "SKIP_FORMAT", "  {} {}", "✓".green().bold(), format!("{} is complete", path.display()).bold());
    } else {
        info!(name: "SKIP_FORMAT", "");
        info!(
            name: "SKIP_FORMAT",
            "  {}: {} error(s), {} warning(s)",
            path.display().to_string().bold(),
            errors.to_string().red(),
            warnings.to_string().yellow()
        );
    }

    info!(name: "SKIP_FORMAT", "");
}
