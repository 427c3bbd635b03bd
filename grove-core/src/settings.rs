//! Shared scan defaults that align with outer configuration knobs.
//!
//! Keeping the extension lists in one place lets the config crate expose
//! user-facing overrides without diverging from the engine's filtering
//! rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::marker::DEFAULT_MARKER_FILE_NAME;

/// Recognized video container extensions.
pub const DEFAULT_VIDEO_FILE_EXTENSIONS: &[&str] =
    &["mkv", "mp4", "m4v", "ts", "webm", "avi", "wmv", "ogv"];

/// Recognized subtitle extensions, in priority order: when one basename has
/// several subtitle files, the earliest-listed extension wins.
pub const DEFAULT_SUBTITLE_FILE_EXTENSIONS: &[&str] =
    &["srt", "smi", "sami", "ass", "ssa", "idx", "sub"];

/// Access tier stamped onto newly discovered folders.
pub const DEFAULT_ACCESS_TIER: &str = "public";

/// Convenience helper for consumers that work with owned strings (e.g.
/// config deserialisation layers).
pub fn default_video_file_extensions_vec() -> Vec<String> {
    DEFAULT_VIDEO_FILE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

pub fn default_subtitle_file_extensions_vec() -> Vec<String> {
    DEFAULT_SUBTITLE_FILE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_access_tier() -> String {
    DEFAULT_ACCESS_TIER.to_string()
}

fn default_marker_file_name() -> String {
    DEFAULT_MARKER_FILE_NAME.to_string()
}

/// Engine-level scan settings. The extension sets are closed lists supplied
/// by configuration; matching is always case-insensitive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanSettings {
    /// File extensions treated as video assets.
    pub video_extensions: Vec<String>,
    /// File extensions treated as subtitle assets, in priority order.
    pub subtitle_extensions: Vec<String>,
    /// Access tier written onto folders discovered as new.
    pub access_tier: String,
    /// Name of the per-directory identity marker file.
    pub marker_file_name: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            video_extensions: default_video_file_extensions_vec(),
            subtitle_extensions: default_subtitle_file_extensions_vec(),
            access_tier: default_access_tier(),
            marker_file_name: default_marker_file_name(),
        }
    }
}

impl ScanSettings {
    pub fn is_video(&self, path: &Path) -> bool {
        Self::extension_matches(path, &self.video_extensions)
    }

    pub fn is_subtitle(&self, path: &Path) -> bool {
        Self::extension_matches(path, &self.subtitle_extensions)
    }

    /// Rank of a subtitle extension in the priority order; lower wins.
    pub fn subtitle_priority(&self, path: &Path) -> Option<usize> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.subtitle_extensions
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(&ext))
    }

    fn extension_matches(path: &Path, extensions: &[String]) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        extensions.iter().any(|candidate| candidate.eq_ignore_ascii_case(&ext))
    }
}
