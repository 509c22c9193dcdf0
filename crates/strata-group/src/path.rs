//! Group paths
//!
//! Provides [`GroupPath`] for addressing a group inside the group tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between group path segments
pub const SEPARATOR: char = '/';

/// Path of a group inside the tree
///
/// Each segment is the name of one group; the full path is the group's
/// name concatenated with the names of its ancestors.
///
/// # Examples
/// - `["dev"]` → `dev`
/// - `["dev", "ew1", "jump-host"]` → `dev/ew1/jump-host`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GroupPath(Vec<String>);

impl GroupPath {
    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (above the root group)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if any)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Own name of the addressed group (last segment)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Prepend `prefix` to this path, returning new path
    #[must_use]
    pub fn prefixed(&self, prefix: &Self) -> Self {
        let mut segments = prefix.0.clone();
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `dev` is prefix of `dev/ew1`
    /// - `dev` is NOT prefix of `prod/ew1`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for GroupPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for GroupPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split(SEPARATOR)
            .map(|seg| validate_segment(seg).map(str::to_string))
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

/// Validate a single group name
///
/// Names are non-empty and made of alphanumerics, `-`, `_` or `.`.
///
/// # Errors
/// Returns [`PathError`] when the segment is empty or contains other characters.
pub fn validate_segment(segment: &str) -> Result<&str, PathError> {
    if segment.is_empty() {
        Err(PathError::EmptySegment)
    } else if segment
        .contains(|c: char| !c.is_alphanumeric() && !matches!(c, '-' | '_' | '.'))
    {
        Err(PathError::InvalidSegment(segment.to_string()))
    } else {
        Ok(segment)
    }
}

impl Serialize for GroupPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to group paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("group path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid group name: {0} (must be alphanumeric, '-', '_' or '.')")]
    InvalidSegment(String),
}
