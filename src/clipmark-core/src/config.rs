//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! the `PORT` environment variable, then command-line flags.

use anyhow::{Context, Result};
use clipmark_store::DEFAULT_RESULTS_FILE;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the source videos
    pub video_dir: PathBuf,

    /// Directory holding the annotation document
    pub results_dir: PathBuf,

    /// File name of the annotation document inside `results_dir`
    pub results_file: String,

    /// Address to bind (all interfaces by default)
    pub host: IpAddr,

    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub video_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML {:?}", path))
    }

    /// Resolve the full configuration
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let port_env = std::env::var(PORT_ENV).ok();
        config.apply_port_env(port_env.as_deref())?;
        config.apply_overrides(overrides);

        Ok(config)
    }

    /// Apply the raw value of the `PORT` variable, if set
    pub fn apply_port_env(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(value) = value {
            self.port = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got {:?}", PORT_ENV, value))?;
        }
        Ok(())
    }

    /// Apply command-line flags
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref dir) = overrides.video_dir {
            self.video_dir = dir.clone();
        }
        if let Some(ref dir) = overrides.results_dir {
            self.results_dir = dir.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
    }

    /// Full path of the annotation document
    pub fn results_path(&self) -> PathBuf {
        self.results_dir.join(&self.results_file)
    }

    /// Address the server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
