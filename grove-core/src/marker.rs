use std::io;
use std::path::Path;

use grove_model::FolderId;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::fs::FileSystem;

/// Default name of the per-directory identity marker.
///
/// The leading dot is the best-effort hidden attribute: platforms that hide
/// dotfiles get a hidden marker for free, platforms that don't still accept
/// the write.
pub const DEFAULT_MARKER_FILE_NAME: &str = ".grove-id";

/// On-disk shape of the identity marker: a single-field JSON document.
#[derive(Debug, Serialize, Deserialize)]
struct MarkerFile {
    folder_id: i64,
}

/// Read the identity marker inside `dir`.
///
/// Returns `Ok(None)` when no marker exists. An unreadable marker is fatal
/// to the run, as is a marker whose content does not parse: structural
/// corruption cannot be skipped without risking a duplicate identity.
pub async fn read_marker(
    fs: &dyn FileSystem,
    dir: &Path,
    marker_name: &str,
) -> Result<Option<FolderId>> {
    let path = dir.join(marker_name);
    let raw = match fs.read_to_string(&path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(EngineError::Marker { path, source: err }),
    };

    let parsed: MarkerFile =
        serde_json::from_str(&raw).map_err(|err| EngineError::CorruptMarker {
            path,
            detail: err.to_string(),
        })?;

    Ok(Some(FolderId::new(parsed.folder_id)))
}

/// Write a fresh identity marker into `dir`. Failures are fatal to the run;
/// a directory that cannot hold its marker cannot be tracked.
pub async fn write_marker(
    fs: &dyn FileSystem,
    dir: &Path,
    marker_name: &str,
    id: FolderId,
) -> Result<()> {
    let path = dir.join(marker_name);
    let body = serde_json::to_string(&MarkerFile {
        folder_id: id.get(),
    })
    .expect("marker serialization is infallible");

    fs.write_file(&path, body.as_bytes())
        .await
        .map_err(|err| EngineError::Marker { path, source: err })
}
