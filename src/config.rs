//! Configuration management for polyglot-tts.
//!
//! Loads config from YAML files in standard locations. Everything has a
//! sensible default so the server starts with no config file at all
//! (though without declared voices it can only serve empty voice lists).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// The single PCM contract shared by backend output and encoder input.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
        }
    }
}

/// A voice the synthesis backend command can speak with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceEntry {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub age: String,
    pub enabled: bool,
}

impl Default for VoiceEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            gender: "Neutral".into(),
            age: "Adult".into(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Synthesizer executable. Invoked per synthesis call with `args`
    /// followed by the voice id and the text; must write interleaved
    /// little-endian i16 PCM at the configured audio contract to stdout.
    pub command: String,
    pub args: Vec<String>,
    pub voices: Vec<VoiceEntry>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: vec![],
            voices: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/polyglot-tts/config.yaml
    /// 3. /etc/polyglot-tts/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/polyglot-tts/config.yaml")),
                Some(PathBuf::from("/etc/polyglot-tts/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }
}
