//! The site content checklist: every value the website template consumes.
//!
//! Content is written by hand in a single YAML file (`content.yaml` by default). Every group is optional when
//! loading so that a half-filled checklist can still be loaded and linted with [`check`](crate::checklist::check).
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::ContentError;

const STARTER_TEMPLATE: &str = include_str!("starter_content.yaml");

/// Default location of the logo asset, relative to the site directory.
pub const DEFAULT_LOGO_PATH: &str = "assets/logo.svg";

/// Returns the blank checklist, with labels and guidance comments for every field.
pub fn starter_template() -> &'static str {
    STARTER_TEMPLATE
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteContent {
    pub company: CompanyProfile,
    pub contact: ContactInfo,
    pub hero: HeroCopy,
    pub services: Vec<Service>,
    pub gallery: Vec<GalleryEntry>,
    pub testimonials: Vec<Testimonial>,
    /// "How it works" steps, in display order.
    pub process: Vec<String>,
    pub cta: CtaCopy,
    /// Plain-language licensing disclaimers.
    pub compliance: Vec<String>,
    pub assets: AssetPaths,
}

impl SiteContent {
    pub fn from_yaml_str(source: &str) -> Result<Self, ContentError> {
        Self::parse(source, Path::new("<inline>"))
    }

    /// Reads and parses a checklist file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let content = Self::parse(&source, path)?;
        log::debug!(target: "content", "Loaded content from {}", path.display());
        Ok(content)
    }

    fn parse(source: &str, path: &Path) -> Result<Self, ContentError> {
        // An empty file is an empty checklist, not a parse error.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(source).map_err(|source| ContentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompanyProfile {
    pub name: String,
    pub owner: String,
    pub tagline: String,
    /// e.g. "Licensed general contractor, CSLB #123456"
    pub licensing: String,
    pub insurance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactInfo {
    /// Public address, also used for the `mailto:` fallback of the contact form.
    pub email: String,
    pub phone: Option<String>,
    pub service_areas: Vec<String>,
    pub hours: String,
}

impl ContactInfo {
    /// `mailto:` link used when the contact form is unavailable.
    pub fn mailto_href(&self) -> Option<String> {
        let email = self.email.trim();
        if email.is_empty() {
            None
        } else {
            Some(format!("mailto:{email}"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeroCopy {
    pub summary: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Service {
    pub title: String,
    /// Short qualifier shown under the title, e.g. "Kitchens & baths".
    pub qualifier: String,
}

/// A finished project shown in the gallery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryEntry {
    pub title: String,
    pub location: String,
    pub scope: String,
    pub duration: String,
    pub date: String,
    pub image: String,
    pub alt_text: String,
}

impl GalleryEntry {
    /// Whether the image is hosted elsewhere rather than shipped with the site.
    pub fn is_remote_image(&self) -> bool {
        let image = self.image.trim();
        image.starts_with("http://") || image.starts_with("https://") || image.starts_with("//")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Testimonial {
    pub quote: String,
    /// Full name or initials.
    pub name: String,
    pub neighborhood: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CtaCopy {
    /// Main button, e.g. "Get Estimate".
    pub primary: String,
    pub secondary: String,
    pub encouragement: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetPaths {
    pub logo: String,
    pub favicon: String,
    pub social_image: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            logo: DEFAULT_LOGO_PATH.to_string(),
            favicon: String::new(),
            social_image: String::new(),
        }
    }
}
