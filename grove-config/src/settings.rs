use anyhow::{Context, anyhow};
use grove_core::ScanSettings;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Source that produced the engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Top-level Grove settings. Use these to adjust which file extensions are
/// treated as video or subtitle assets, the access tier stamped onto new
/// folders, and the identity marker filename.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GroveConfig {
    /// Engine scan settings: the closed video/subtitle extension lists
    /// (subtitles in priority order, where the earliest extension wins a
    /// basename collision), the default access tier, and the marker
    /// filename. Defaults mirror the core's built-in lists so user
    /// overrides can flow through without diverging behaviour.
    pub scan: ScanSettings,
}

impl GroveConfig {
    /// Load configuration overrides using environment variables.
    /// Evaluation order:
    /// 1) `$GROVE_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$GROVE_CONFIG_JSON` (inline JSON),
    /// 3) default candidate files, then defaults if none is present.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        if let Ok(path_str) = env::var("GROVE_CONFIG_PATH")
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var("GROVE_CONFIG_JSON")
            && !raw.trim().is_empty()
        {
            let parsed =
                Self::parse_json(&raw).context("failed to parse GROVE_CONFIG_JSON")?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            tracing::info!("Loaded grove config from {}", path.display());
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read grove config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents)
                .with_context(|| format!("invalid grove config {}", path.display())),
            Some("toml") | Some("tml") => toml::from_str(&contents)
                .map_err(|err| anyhow!("invalid grove config {}: {}", path.display(), err)),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // Try TOML first, then JSON for convenience.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse grove config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("invalid grove config json: {err}"))
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "grove.toml",
            "grove.json",
            "config/grove.toml",
            "config/grove.json",
        ];

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(|path| path.to_path_buf())
    }
}
