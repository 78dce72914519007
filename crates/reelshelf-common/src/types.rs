//! Core type definitions for reelshelf.
//!
//! All enums serialize in lowercase, which is also the form stored in the
//! catalog database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The kind of media a catalog item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    #[serde(rename = "tvshow")]
    TvShow,
    Other,
}

impl MediaKind {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "tvshow",
            MediaKind::Other => "other",
        }
    }

    /// Name shown by library UIs ("Movies", "TV Shows", "Other").
    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movies",
            MediaKind::TvShow => "TV Shows",
            MediaKind::Other => "Other",
        }
    }

    /// Whether files of this kind are indexed at all.
    pub fn is_candidate(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    /// Accepts the canonical names as well as the display names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "tvshow" | "tv" | "tv shows" | "tv show" | "tvshows" | "show" | "shows" | "series" => {
                Ok(MediaKind::TvShow)
            }
            "other" => Ok(MediaKind::Other),
            _ => Err(Error::invalid_input(format!("unknown media kind: {s}"))),
        }
    }
}

/// Terminal (or in-flight) state of a scan run as recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ScanStatus::Running),
            "completed" => Ok(ScanStatus::Completed),
            "cancelled" => Ok(ScanStatus::Cancelled),
            "failed" => Ok(ScanStatus::Failed),
            _ => Err(Error::invalid_input(format!("unknown scan status: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_serialization() {
        assert_eq!(serde_json::to_string(&MediaKind::Movie).unwrap(), "\"movie\"");
        assert_eq!(serde_json::to_string(&MediaKind::TvShow).unwrap(), "\"tvshow\"");
        assert_eq!(serde_json::to_string(&MediaKind::Other).unwrap(), "\"other\"");
    }

    #[test]
    fn test_media_kind_display_round_trip() {
        for kind in [MediaKind::Movie, MediaKind::TvShow, MediaKind::Other] {
            assert_eq!(kind.to_string().parse::<MediaKind>().unwrap(), kind);
            assert_eq!(kind.display_name().parse::<MediaKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_media_kind_rejects_unknown() {
        assert!("podcast".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_candidate_kinds() {
        assert!(MediaKind::Movie.is_candidate());
        assert!(MediaKind::TvShow.is_candidate());
        assert!(!MediaKind::Other.is_candidate());
    }

    #[test]
    fn test_scan_status_round_trip() {
        for status in [
            ScanStatus::Running,
            ScanStatus::Completed,
            ScanStatus::Cancelled,
            ScanStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ScanStatus>().unwrap(), status);
        }
    }
}
