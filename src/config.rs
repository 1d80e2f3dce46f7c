//! Optional TOML configuration for the `battlecard` binary.
//!
//! ```toml
//! [chart]
//! width = 1400
//! title = "Revenue Flow"
//!
//! [normalize]
//! root_candidates = ["Net Sales", "Total Revenue"]
//!
//! [palette.end_markets]
//! "AI/Datacenter" = "#FF0000"
//! ```
//!
//! Every section and key is optional.

use crate::display::Palette;
use crate::store::taxonomy::ROOT_CANDIDATES;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "BATTLECARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "battlecard.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid config file '{path}': {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { width: 1200, height: 600, title: "Revenue Flow: Segments to End Markets".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Labels tried, in order, as the 100% node.
    pub root_candidates: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { root_candidates: ROOT_CANDIDATES.iter().map(|s| s.to_string()).collect() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chart: ChartConfig,
    pub normalize: NormalizeConfig,
    pub palette: Palette,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Picks the config file: an explicit path, else the path named by
    /// `env_path`, else `fallback` when it exists. An explicit or env path
    /// is returned even if missing so that the read fails loudly.
    pub fn locate(explicit: Option<&Path>, env_path: Option<PathBuf>, fallback: &Path) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or(env_path)
            .or_else(|| fallback.is_file().then(|| fallback.to_path_buf()))
    }

    /// Loads from `--config`, `$BATTLECARD_CONFIG` or `./battlecard.toml`,
    /// falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match Self::locate(explicit, env_path, Path::new(DEFAULT_CONFIG_FILE)) {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chart]\nwidth = 1400\n\n[normalize]\nroot_candidates = [\"Net Sales\"]").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chart.width, 1400);
        assert_eq!(config.chart.height, 600);
        assert_eq!(config.normalize.root_candidates, vec!["Net Sales"]);
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn test_palette_section_overrides_colours() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[palette]\ndefault_color = \"#000000\"\n\n[palette.end_markets]\n\"Mobile\" = \"#111111\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.palette.node_color("Mobile", None), "#111111");
        assert_eq!(config.palette.node_color("Unknown", None), "#000000");
        // Entries not named in the file keep their built-in colours.
        assert_eq!(config.palette.node_color("Total Revenue", None), "#34495E");
        assert_eq!(config.palette.node_color("AI/Datacenter", None), "#2E86AB");
    }

    #[test]
    fn test_bad_toml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chart\nwidth = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_locate_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join(DEFAULT_CONFIG_FILE);
        let explicit = dir.path().join("explicit.toml");
        let env = dir.path().join("env.toml");

        assert_eq!(AppConfig::locate(None, None, &fallback), None);
        fs::write(&fallback, "").unwrap();
        assert_eq!(AppConfig::locate(None, None, &fallback), Some(fallback.clone()));
        assert_eq!(AppConfig::locate(None, Some(env.clone()), &fallback), Some(env.clone()));
        assert_eq!(AppConfig::locate(Some(&explicit), Some(env), &fallback), Some(explicit));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
