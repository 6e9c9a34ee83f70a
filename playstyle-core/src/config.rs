//! Configuration for the playstyle service.
//!
//! Maps directly to `playstyle.toml`. Every section and field has a default,
//! so an empty file (or no file at all) yields a working service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaystyleConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Listener, framing and port-discovery settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Event store location.
    #[serde(default)]
    pub store: StoreConfig,
}

impl PlaystyleConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PlaystyleError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PlaystyleError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Socket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Loopback host to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// First port tried during startup.
    #[serde(default = "default_start_port")]
    pub start_port: u16,
    /// How many consecutive ports (starting at `start_port`) are tried.
    #[serde(default = "default_port_scan_width")]
    pub port_scan_width: u16,
    /// Side-channel file the bound port is published to.
    #[serde(default = "default_port_file")]
    pub port_file: PathBuf,
    /// Size of a single socket read.
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
    /// Largest message accepted before the frame is discarded.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            start_port: default_start_port(),
            port_scan_width: default_port_scan_width(),
            port_file: default_port_file(),
            read_chunk_bytes: default_read_chunk_bytes(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

/// Event store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite event database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_start_port() -> u16 { 50705 }
fn default_port_scan_width() -> u16 { 10 }
fn default_port_file() -> PathBuf { PathBuf::from("data/ai_port.txt") }
fn default_read_chunk_bytes() -> usize { 4096 }
fn default_max_frame_bytes() -> usize { 1024 * 1024 }
fn default_db_path() -> PathBuf { PathBuf::from("data/snake_game.db") }
