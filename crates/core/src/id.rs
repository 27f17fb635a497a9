//! Identifiers and ordinal keys for curriculum entities.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Stable identifier of a course within a curriculum snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    /// Create from any string-like value. Surrounding whitespace is dropped.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CourseId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::str::FromStr for CourseId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

static TIER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:s|sem|semestre|semester)?\s*\.?\s*(\d{1,2})\s*$")
        .expect("tier label pattern is valid")
});

/// Ordinal semester tier (1..=N) at which a course is nominally offered.
///
/// Parsed from labels such as `"S3"`, `"Semestre 3"` or `"3"`, always
/// displayed as `"S3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemesterTier(u8);

impl SemesterTier {
    /// Create from an ordinal. Tier zero does not exist.
    pub fn new(ordinal: u8) -> Option<Self> {
        (ordinal > 0).then_some(Self(ordinal))
    }

    /// The ordinal value.
    pub fn ordinal(self) -> u8 {
        self.0
    }

    /// The tier immediately after this one.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Whether `other` is exactly one tier before or after this one.
    pub fn is_adjacent_to(self, other: SemesterTier) -> bool {
        self.0.abs_diff(other.0) == 1
    }
}

impl std::fmt::Display for SemesterTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Label that could not be read as a semester tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid semester label '{0}'")]
pub struct InvalidTierLabel(pub String);

impl std::str::FromStr for SemesterTier {
    type Err = InvalidTierLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TIER_LABEL
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .and_then(SemesterTier::new)
            .ok_or_else(|| InvalidTierLabel(s.to_string()))
    }
}

impl TryFrom<String> for SemesterTier {
    type Error = InvalidTierLabel;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SemesterTier> for String {
    fn from(tier: SemesterTier) -> Self {
        tier.to_string()
    }
}
