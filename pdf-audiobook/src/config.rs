//! pdf-audio configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::text::chunker::DEFAULT_MAX_CHUNK_CHARS;

const DEFAULT_VOICE: &str = "british-female";
const DEFAULT_BITRATE_KBPS: u32 = 192;
const DEFAULT_HEADING_RATIO: f32 = 1.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfAudioConfig {
    /// Default voice as accent-gender (e.g. "british-female")
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Maximum characters per synthesis chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Provider preference order
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// MP3 bitrate in kbit/s
    #[serde(default = "default_bitrate")]
    pub bitrate_kbps: u32,

    /// Font-size multiple over body text that marks a heading
    #[serde(default = "default_heading_ratio")]
    pub heading_ratio: f32,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_providers() -> Vec<String> {
    vec![
        "azure".to_string(),
        "google".to_string(),
        "espeak".to_string(),
    ]
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE_KBPS
}

fn default_heading_ratio() -> f32 {
    DEFAULT_HEADING_RATIO
}

impl Default for PdfAudioConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            chunk_size: default_chunk_size(),
            providers: default_providers(),
            bitrate_kbps: default_bitrate(),
            heading_ratio: default_heading_ratio(),
        }
    }
}

impl PdfAudioConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-audio.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("pdf-audio.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PdfAudioConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PdfAudioConfig::default();
        assert_eq!(config.voice, "british-female");
        assert_eq!(config.chunk_size, 4500);
        assert_eq!(config.providers, vec!["azure", "google", "espeak"]);
        assert_eq!(config.bitrate_kbps, 192);
    }

    #[test]
    fn test_config_path() {
        let path = PdfAudioConfig::config_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.ends_with("cli-programs/pdf-audio.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
voice = "american-male"
chunk_size = 4000
providers = ["espeak"]
bitrate_kbps = 128
"#;
        let config: PdfAudioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice, "american-male");
        assert_eq!(config.chunk_size, 4000);
        assert_eq!(config.providers, vec!["espeak"]);
        assert_eq!(config.bitrate_kbps, 128);
        assert_eq!(config.heading_ratio, 1.2);
    }

    #[test]
    fn test_parse_empty_config() {
        let toml_str = "";
        let config: PdfAudioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice, "british-female");
        assert_eq!(config.chunk_size, 4500);
    }
}
