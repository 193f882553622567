use std::path::Path;

use colored::Colorize;
use tracing::info;
use tradesite::starter_template;

use crate::errors::InitError;

/// Writes the blank checklist to `path`.
pub fn write_starter(path: &Path, force: bool) -> Result<(), InitError> {
    if path.exists() && !force {
        return Err(InitError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| InitError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, starter_template()).map_err(|source| InitError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(name: "SKIP_FORMAT", "");
    info!(name: "SKIP_FORMAT", "  {} {}", "Created".green().bold(), path.display());
    info!(name: "SKIP_FORMAT", "  {}", format!("Fill it in, then run `tradesite check {}`", path.display()).dimmed());
    info!(name: "SKIP_FORMAT", "");

    Ok(())
}
