use chrono::{DateTime, Utc};

use crate::ids::{ContentId, MediaRecordId};

/// One record per video file (and its paired subtitle) under a content unit.
///
/// `base_name` is the filename without extension and is unique within a
/// content unit; a subtitle whose basename matches no video produces no
/// record at all.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRecord {
    pub id: MediaRecordId,
    pub content_id: ContentId,
    pub base_name: String,
    /// Video file name, relative to the content directory.
    pub video_path: String,
    /// Paired subtitle file name, relative to the content directory.
    pub subtitle_path: Option<String>,
    /// Stamped whenever `subtitle_path` changes.
    pub subtitle_added_at: Option<DateTime<Utc>>,
}

impl MediaRecord {
    /// Replace the subtitle pairing, stamping the change instant when the
    /// path actually differs.
    pub fn set_subtitle(&mut self, subtitle_path: Option<String>, at: DateTime<Utc>) {
        if self.subtitle_path != subtitle_path {
            self.subtitle_path = subtitle_path;
            self.subtitle_added_at = Some(at);
        }
    }
}
