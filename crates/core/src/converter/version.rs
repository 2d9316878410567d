//! Tool version parsing and compatibility ranges.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+(?:\.\d+)*)(?:[-+](.+))?$").expect("static version pattern")
});

/// A dotted numeric version with an optional `-suffix`.
///
/// Missing components compare as zero, so `1.0` equals `1.0.0`. A suffixed
/// version sorts before the same version without one.
#[derive(Clone, Debug, Eq)]
pub struct ToolVersion {
    segments: Vec<u64>,
    suffix: Option<String>,
}

impl ToolVersion {
    pub fn new(segments: &[u64]) -> Self {
        Self {
            segments: segments.to_vec(),
            suffix: None,
        }
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    fn segment(&self, i: usize) -> u64 {
        self.segments.get(i).copied().unwrap_or(0)
    }

    /// Same numeric components, ignoring any suffix.
    fn same_release(&self, other: &Self) -> bool {
        let len = self.segments.len().max(other.segments.len());
        (0..len).all(|i| self.segment(i) == other.segment(i))
    }
}

impl FromStr for ToolVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| Error::VersionParse(s.to_string()))?;
        let segments = caps[1]
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::VersionParse(s.to_string()))?;
        Ok(Self {
            segments,
            suffix: caps.get(2).map(|m| m.as_str().to_string()),
        })
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
            first = false;
        }
        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

/// Half-open range `>= min, < max` of supported tool versions.
///
/// A suffixed (pre-release) version only matches when a bound carries a
/// suffix on the same release, so `24.12.0-rc1` is outside `>= 24.11.0, < 25.0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionRange {
    pub min: ToolVersion,
    pub max: ToolVersion,
}

impl VersionRange {
    pub fn new(min: ToolVersion, max: ToolVersion) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, version: &ToolVersion) -> bool {
        if version.suffix.is_some() {
            let bound_allows = |bound: &ToolVersion| {
                bound.suffix.is_some() && bound.same_release(version)
            };
            if !bound_allows(&self.min) && !bound_allows(&self.max) {
                return false;
            }
        }
        *version >= self.min && *version < self.max
    }

    /// Fail with [`Error::UnsupportedVersion`] unless `raw` parses and lies in range.
    pub fn check(&self, raw: &str) -> Result<ToolVersion> {
        let version: ToolVersion = raw.parse()?;
        if !self.contains(&version) {
            return Err(Error::UnsupportedVersion {
                version: raw.to_string(),
                range: self.to_string(),
            });
        }
        Ok(version)
    }
}

impl Default for VersionRange {
    /// The poppler releases whose `-xml` layout this crate understands.
    fn default() -> Self {
        Self {
            min: ToolVersion::new(&[24, 11, 0]),
            max: ToolVersion::new(&[25, 0]),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">= {}, < {}", self.min, self.max)
    }
}

/// Pull the version out of a poppler `-v` banner such as
/// `pdftohtml version 24.11.0\nCopyright ...`.
pub(crate) fn version_from_banner(tool: &str, banner: &str) -> Option<String> {
    let pattern = format!(r"{} version ([^\n]+)\n", regex::escape(tool));
    let re = Regex::new(&pattern).ok()?;
    re.captures(banner).map(|caps| caps[1].to_string())
}
