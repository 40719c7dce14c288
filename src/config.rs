//! Configuration persistence for pinmark settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::render::width::{FULL_WIDTH_TOLERANCE_PX, PageLayout, WidthResolver};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Editor content width used when the host does not report one
    #[serde(default = "default_editor_width_px")]
    pub editor_width_px: f64,
    /// Preview widths this close to the editor width count as full width
    #[serde(default = "default_full_width_tolerance_px")]
    pub full_width_tolerance_px: f64,
    #[serde(default)]
    pub page: PageLayout,
    /// Vertical gap between figures in the paginated export
    #[serde(default = "default_block_spacing_pt")]
    pub block_spacing_pt: f64,
}

fn default_editor_width_px() -> f64 {
    800.0
}

fn default_full_width_tolerance_px() -> f64 {
    FULL_WIDTH_TOLERANCE_PX
}

fn default_block_spacing_pt() -> f64 {
    6.0
}

impl Config {
    /// `$XDG_CONFIG_HOME/pinmark/config.json` or the platform equivalent
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pinmark").join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            log::error!("No config directory to save to");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
    }

    /// Apply command-line overrides; returns whether anything changed
    pub fn apply_overrides(&mut self, editor_width_px: Option<f64>) -> bool {
        match editor_width_px.filter(|w| w.is_finite() && *w > 0.0) {
            Some(width) if width != self.editor_width_px => {
                self.editor_width_px = width;
                true
            }
            _ => false,
        }
    }

    pub fn width_resolver(&self) -> WidthResolver {
        WidthResolver::new(self.editor_width_px, self.page)
            .with_tolerance(self.full_width_tolerance_px)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor_width_px: default_editor_width_px(),
            full_width_tolerance_px: default_full_width_tolerance_px(),
            page: PageLayout::default(),
            block_spacing_pt: default_block_spacing_pt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"editor_width_px": 640}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.editor_width_px, 640.0);
        assert_eq!(config.full_width_tolerance_px, 2.0);
        assert_eq!(config.page, PageLayout::default());
        assert_eq!(config.block_spacing_pt, 6.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.block_spacing_pt = 12.0;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
        assert!(Config::load_from(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        assert!(!config.apply_overrides(None));
        assert!(!config.apply_overrides(Some(800.0)));
        assert!(!config.apply_overrides(Some(-5.0)));
        assert!(config.apply_overrides(Some(640.0)));
        assert_eq!(config.editor_width_px, 640.0);
    }

    #[test]
    fn test_width_resolver_from_config() {
        let config = Config::default();
        let resolver = config.width_resolver();
        assert_eq!(resolver.editor_width_px, 800.0);
        assert_eq!(resolver.resolve(None), config.page.printable_width_pt());
    }
}
