use chrono::{DateTime, Datelike, Utc};

use crate::error::ModelError;
use crate::ids::{ContentId, FolderId};

/// The closed set of library kinds a run operates on. Selects the store
/// partition; every record written by a run carries the run's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    Movie,
    Drama,
    Anime,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Drama => "drama",
            MediaKind::Anime => "anime",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "drama" => Ok(MediaKind::Drama),
            "anime" => Ok(MediaKind::Anime),
            other => Err(ModelError::InvalidKind(other.to_string())),
        }
    }
}

/// One record per promoted folder. Created once when a media-bearing folder
/// with no media-bearing ancestor is first seen; never deleted or re-titled
/// by the engine afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentUnit {
    pub id: ContentId,
    /// Folder name at promotion time; intentionally not kept in sync with
    /// later renames.
    pub title: String,
    pub kind: MediaKind,
    pub folder_id: FolderId,
    /// Quarter the content entered the library, e.g. `2026Q3`. Derived from
    /// the promotion instant, not from the content itself.
    pub release_period: String,
    pub modified_at: DateTime<Utc>,
}

impl ContentUnit {
    /// Format the release period for a promotion instant.
    pub fn release_period_for(at: DateTime<Utc>) -> String {
        let quarter = (at.month() - 1) / 3 + 1;
        format!("{}Q{}", at.year(), quarter)
    }
}
