//! Tag list validation
//!
//! Tags are short labels: letters, digits, spaces, underscores, hyphens.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum length of a single tag
const MAX_TAG_LEN: usize = 50;

/// Maximum number of tags on one record
const MAX_TAGS: usize = 100;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 _-]+$").expect("invalid tag regex"));

/// Validated, de-duplicated tag list.
///
/// Order of first occurrence is preserved. Because duplicates are dropped,
/// the list and the tag index rows derived from it are always equal as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Validate and normalize a tag list.
    ///
    /// # Example
    /// ```
    /// use vault_store::models::Tags;
    ///
    /// let tags = Tags::new(["work", "urgent", "work"]).unwrap();
    /// assert_eq!(tags.as_slice(), ["work", "urgent"]);
    /// assert!(Tags::new(["no/slashes"]).is_err());
    /// ```
    pub fn new<I, S>(tags: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if tag.trim().is_empty() {
                return Err(ValidationError::Empty { field: "tag" });
            }
            if tag.chars().count() > MAX_TAG_LEN {
                return Err(ValidationError::TooLong {
                    field: "tag",
                    max: MAX_TAG_LEN,
                });
            }
            if !TAG_RE.is_match(&tag) {
                return Err(ValidationError::InvalidFormat {
                    field: "tag",
                    reason: "only letters, numbers, spaces, underscores and hyphens are allowed",
                });
            }
            if !out.contains(&tag) {
                out.push(tag);
            }
        }

        if out.len() > MAX_TAGS {
            return Err(ValidationError::TooMany {
                field: "tags",
                max: MAX_TAGS,
            });
        }

        Ok(Self(out))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl TryFrom<Vec<String>> for Tags {
    type Error = ValidationError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl AsRef<[String]> for Tags {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
