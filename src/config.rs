use crate::audio::EncoderParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_bit_rate")]
    pub bit_rate: i32,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: i32,

    #[serde(default = "default_channels")]
    pub channels: i32,

    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: i32,

    /// Scratch output buffer size; twice the frame size when unset.
    #[serde(default)]
    pub output_capacity: Option<usize>,

    /// Size of the PCM chunks read from the input and handed to the encoder.
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
}

fn default_bit_rate() -> i32 {
    64000
}

fn default_sample_rate() -> i32 {
    16000
}

fn default_channels() -> i32 {
    1
}

fn default_bits_per_sample() -> i32 {
    16
}

fn default_read_chunk_bytes() -> usize {
    4096
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bit_rate: default_bit_rate(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bits_per_sample: default_bits_per_sample(),
            output_capacity: None,
            read_chunk_bytes: default_read_chunk_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/aacstream/config.json)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing the defaults there if the
    /// file does not exist yet.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("aacstream").join("config.json"))
    }

    /// Reject values that can never produce a working session.
    ///
    /// Format fields are only checked for sign here; the session performs
    /// the authoritative validation when it opens.
    pub fn validate(&self) -> Result<()> {
        if self.bit_rate <= 0 {
            return Err(anyhow::anyhow!("bit_rate must be positive"));
        }

        if self.sample_rate <= 0 {
            return Err(anyhow::anyhow!("sample_rate must be positive"));
        }

        if self.channels <= 0 {
            return Err(anyhow::anyhow!("channels must be positive"));
        }

        if self.read_chunk_bytes == 0 {
            return Err(anyhow::anyhow!("read_chunk_bytes cannot be zero"));
        }

        if self.output_capacity == Some(0) {
            return Err(anyhow::anyhow!("output_capacity cannot be zero"));
        }

        Ok(())
    }

    pub fn params(&self) -> EncoderParams {
        EncoderParams::new(
            self.bit_rate,
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
        )
    }
}
