//! Frequency channels identified by string tags such as `"030"` or `"857"`.
//!
//! The tag is kept verbatim (it is what file templates substitute) and its
//! numeric value is read as GHz.

use std::fmt;
use std::str::FromStr;

use crate::error::SpectralError;

/// The nine Planck LFI + HFI channels, in ascending frequency.
pub const PLANCK_FREQUENCIES: [&str; 9] = [
    "030", "044", "070", "100", "143", "217", "353", "545", "857",
];

/// A fresh copy of [`PLANCK_FREQUENCIES`] as owned tags.
pub fn default_frequencies() -> Vec<String> {
    PLANCK_FREQUENCIES.iter().map(|s| s.to_string()).collect()
}

/// A frequency channel: its tag and the frequency the tag denotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    tag: String,
    ghz: f64,
}

impl Frequency {
    /// Parse a tag; the tag must be a positive, finite number of GHz.
    pub fn parse(tag: &str) -> Result<Self, SpectralError> {
        let ghz: f64 = tag
            .trim()
            .parse()
            .map_err(|_| SpectralError::InvalidFrequency { tag: tag.to_string() })?;
        if !ghz.is_finite() || ghz <= 0.0 {
            return Err(SpectralError::InvalidFrequency { tag: tag.to_string() });
        }
        Ok(Self {
            tag: tag.to_string(),
            ghz,
        })
    }

    /// Parse a list of tags, keeping their order.
    pub fn parse_all<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Self>, SpectralError> {
        tags.iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn ghz(&self) -> f64 {
        self.ghz
    }

    pub fn hz(&self) -> f64 {
        self.ghz * 1e9
    }
}

impl FromStr for Frequency {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} GHz", self.tag)
    }
}
