use anyhow::{Context, Result};
use neckline_core::{PlacementConfig, SearchStrategy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI configuration: an optional TOML file, then `NECKLINE_*` overrides.
///
/// ```toml
/// asset_dir = "data/necklaces"
/// default_necklace = "necklace2k.png"
///
/// [placement]
/// strategy = "vertical-then-horizontal"
/// min_bust_height = 8
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the necklace catalogue.
    pub asset_dir: PathBuf,
    /// Necklace used when none is named on the command line.
    pub default_necklace: String,
    pub placement: PlacementConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("data/necklaces"),
            default_necklace: "necklace2k.png".to_string(),
            placement: PlacementConfig::default(),
        }
    }
}

impl Settings {
    /// Load `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Override fields from `NECKLINE_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("NECKLINE_ASSET_DIR") {
            self.asset_dir = PathBuf::from(dir);
        }
        if let Ok(name) = std::env::var("NECKLINE_DEFAULT_NECKLACE") {
            self.default_necklace = name;
        }
        if let Ok(s) = std::env::var("NECKLINE_STRATEGY") {
            match s.parse::<SearchStrategy>() {
                Ok(strategy) => self.placement.strategy = strategy,
                Err(e) => tracing::warn!(value = %s, "ignoring NECKLINE_STRATEGY: {e}"),
            }
        }

        let p = &mut self.placement;
        p.min_bust_height = env_i32("NECKLINE_MIN_BUST_HEIGHT", p.min_bust_height);
        p.fallback_offset = env_i32("NECKLINE_FALLBACK_OFFSET", p.fallback_offset);
        p.feather_sigma = env_f32("NECKLINE_FEATHER_SIGMA", p.feather_sigma);
    }

    /// Resolve a necklace argument to a file.
    ///
    /// An existing path is used as is; anything else is looked up by name in
    /// the asset directory. `None` selects the default necklace.
    pub fn necklace_path(&self, necklace: Option<&str>) -> Result<PathBuf> {
        let name = necklace.unwrap_or(&self.default_necklace);
        let direct = Path::new(name);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        let path = self.asset_dir.join(name);
        if !path.is_file() {
            anyhow::bail!("necklace not found: {name} (looked in {})", self.asset_dir.display());
        }
        Ok(path)
    }

    /// Image files in the asset directory, sorted by name.
    pub fn catalogue(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.asset_dir)
            .with_context(|| format!("failed to read asset dir {}", self.asset_dir.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "webp" | "tif" | "tiff"));
            if is_image && path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i32(key: &str, default: i32) -> i32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
