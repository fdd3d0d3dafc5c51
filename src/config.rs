//! Configuration types for download operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Output template placeholder that embeds the video identifier.
pub const ID_PLACEHOLDER: &str = "%(id)s";

/// Configuration for the download tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Name or path of the `yt-dlp` executable.
    pub ytdlp_path: PathBuf,
    /// Highest video resolution (in lines) to request.
    pub max_height: u32,
    /// yt-dlp output template, relative to the output directory.
    pub output_template: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            max_height: 1080,
            output_template: "%(title)s-%(id)s.%(ext)s".to_string(),
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the yt-dlp executable.
    #[must_use]
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    /// Sets the resolution ceiling.
    #[must_use]
    pub const fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    /// Sets the output template.
    #[must_use]
    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = template.into();
        self
    }

    /// Checks the values the rest of the crate relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the template does not embed the video id
    /// (the skip check could never find the file) or the height is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.output_template.contains(ID_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "output_template {:?} must contain {ID_PLACEHOLDER}",
                self.output_template
            )));
        }
        if self.output_template.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "output_template {:?} must be a plain file name",
                self.output_template
            )));
        }
        if self.max_height == 0 {
            return Err(Error::Config("max_height must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output directory used when `--out` is not given.
    pub default_out_dir: PathBuf,
    /// Download tool settings.
    pub download: DownloadConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_out_dir: PathBuf::from("outputs/default"),
            download: DownloadConfig::default(),
        }
    }
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location (`<config dir>/vfetch/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vfetch").join("config.toml"))
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read, does not parse,
    /// or holds invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.download.validate()?;
        Ok(config)
    }

    /// Parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_download_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.max_height, 1080);
        assert!(config.output_template.contains(ID_PLACEHOLDER));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn download_config_builder_pattern() {
        let config = DownloadConfig::new()
            .with_ytdlp_path("/opt/bin/yt-dlp")
            .with_max_height(720)
            .with_output_template("%(id)s.%(ext)s");

        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.max_height, 720);
        assert_eq!(config.output_template, "%(id)s.%(ext)s");
    }

    #[test]
    fn template_without_id_is_rejected() {
        let config = DownloadConfig::new().with_output_template("%(title)s.%(ext)s");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn template_with_directories_is_rejected() {
        let config = DownloadConfig::new().with_output_template("%(uploader)s/%(id)s.%(ext)s");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_height_is_rejected() {
        let config = DownloadConfig::new().with_max_height(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_out_dir, PathBuf::from("outputs/default"));
        assert_eq!(config.download, DownloadConfig::default());
    }

    #[test]
    fn app_config_serializes_to_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[download]\nmax_height = 720\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.download.max_height, 720);
        assert_eq!(config.download.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.default_out_dir, PathBuf::from("outputs/default"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_height = [").unwrap();
        assert!(matches!(AppConfig::load(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[download]\noutput_template = \"%(title)s.%(ext)s\"\n").unwrap();
        assert!(matches!(AppConfig::load(Some(&path)), Err(Error::Config(_))));
    }
}
