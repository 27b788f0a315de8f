//! Container image reference parsing.
//!
//! Decomposes `[registry[:port]/]path[:tag][@algorithm:digest]` strings into
//! their parts following the distribution reference grammar. Only string
//! parsing happens here; nothing is resolved against a registry.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Tag implied when a reference carries neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Maximum length of the repository part of a reference.
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

/// Errors that can occur while parsing an image reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageReferenceError {
    #[error("image reference is empty")]
    Empty,

    #[error("invalid image reference format: {reference:?}")]
    Invalid { reference: String },

    #[error("repository name must not be more than 255 characters: {reference:?}")]
    NameTooLong { reference: String },
}

// Pattern: ^(name)(?::(tag))?(?:@(digest))?$
static REFERENCE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let domain_component = r"(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
    let domain = format!(r"{domain_component}(?:\.{domain_component})*(?::[0-9]+)?");
    let path_component = r"[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*";
    let name = format!(r"(?:{domain}/)?{path_component}(?:/{path_component})*");
    let tag = r"[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}";
    let digest = r"[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}";
    Regex::new(&format!(r"^({name})(?::({tag}))?(?:@({digest}))?$")).ok()
});

/// A parsed container image reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository as written, including any registry host.
    pub repository: String,
    /// Explicit tag, if present.
    pub tag: Option<String>,
    /// Content digest (`algorithm:hex`), if present.
    pub digest: Option<String>,
}

impl ImageReference {
    /// Build a tagged reference.
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    /// Parse a raw image reference.
    ///
    /// # Example
    /// ```
    /// use tempo_operator::image::ImageReference;
    ///
    /// let image = ImageReference::parse("docker.io/grafana/tempo:2.7.0").unwrap();
    /// assert_eq!(image.repository, "docker.io/grafana/tempo");
    /// assert_eq!(image.version(), "2.7.0");
    /// ```
    pub fn parse(reference: &str) -> Result<Self, ImageReferenceError> {
        if reference.is_empty() {
            return Err(ImageReferenceError::Empty);
        }

        let invalid = || ImageReferenceError::Invalid {
            reference: reference.to_string(),
        };

        let re = REFERENCE_RE.as_ref().ok_or_else(invalid)?;
        let caps = re.captures(reference).ok_or_else(invalid)?;
        let repository = caps.get(1).ok_or_else(invalid)?.as_str();

        if repository.len() > NAME_TOTAL_LENGTH_MAX {
            return Err(ImageReferenceError::NameTooLong {
                reference: reference.to_string(),
            });
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: caps.get(2).map(|m| m.as_str().to_string()),
            digest: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// The version string reported in status.
    ///
    /// A digest pins the content, so it wins over a tag. Without either the
    /// implied `latest` tag is returned.
    pub fn version(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }
}

impl FromStr for ImageReference {
    type Err = ImageReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
