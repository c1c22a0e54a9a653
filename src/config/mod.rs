//! Configuration module - environment variable and argument parsing

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::util::rate_limit::COMMAND_RATE_LIMIT;

/// Default listening port of the game server
pub const DEFAULT_PORT: u16 = 4444;

/// Map choice that picks any file from the maps directory
pub const RANDOM_MAP: &str = "random";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Map file name (looked up in `maps_dir`), path, or "random"
    pub map: String,
    /// Directory holding `.map` files
    pub maps_dir: PathBuf,

    /// Maximum concurrently connected players
    pub max_players: usize,
    /// Inbound command lines allowed per second per session
    pub command_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{}", DEFAULT_PORT))
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            map: env::var("MAP").unwrap_or_else(|_| RANDOM_MAP.to_string()),
            maps_dir: env::var("MAPS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("maps")),

            max_players: parse_var("MAX_PLAYERS", 8)?,
            command_rate_limit: parse_var("COMMAND_RATE_LIMIT", COMMAND_RATE_LIMIT)?,
        })
    }

    /// Apply the positional `<port> <map>` arguments, either may be omitted
    pub fn with_args<I>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(port) = args.next() {
            let port: u16 = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
            self.server_addr.set_port(port);
        }
        if let Some(map) = args.next() {
            self.map = map;
        }
        Ok(self)
    }

    /// Resolve the configured map to a file on disk
    pub fn map_path(&self) -> Result<PathBuf, ConfigError> {
        if self.map == RANDOM_MAP {
            return random_map(&self.maps_dir);
        }
        let direct = PathBuf::from(&self.map);
        if direct.is_file() {
            return Ok(direct);
        }
        let in_dir = self.maps_dir.join(&self.map);
        if in_dir.is_file() {
            return Ok(in_dir);
        }
        Err(ConfigError::MapNotFound(self.map.clone()))
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Pick any `.map` file in `dir`
fn random_map(dir: &Path) -> Result<PathBuf, ConfigError> {
    let not_found = || ConfigError::NoMaps(dir.display().to_string());
    let mut maps: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| not_found())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "map"))
        .collect();
    maps.sort();
    maps.choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(not_found)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Map {0} not found")]
    MapNotFound(String),

    #[error("No map files found in {0}")]
    NoMaps(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(maps_dir: &Path) -> Config {
        Config {
            server_addr: "0.0.0.0:4444".parse().unwrap(),
            log_level: "info".to_string(),
            map: RANDOM_MAP.to_string(),
            maps_dir: maps_dir.to_path_buf(),
            max_players: 8,
            command_rate_limit: COMMAND_RATE_LIMIT,
        }
    }

    #[test]
    fn positional_args_override_port_and_map() {
        let dir = tempfile::tempdir().unwrap();
        let config = base(dir.path())
            .with_args(["5555".to_string(), "small.map".to_string()])
            .unwrap();
        assert_eq!(config.server_addr.port(), 5555);
        assert_eq!(config.map, "small.map");

        assert!(matches!(
            base(dir.path()).with_args(["port".to_string()]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert_eq!(
            base(dir.path()).with_args(Vec::new()).unwrap().server_addr.port(),
            DEFAULT_PORT
        );
    }

    #[test]
    fn resolves_named_and_random_maps() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.map"), "#E#\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a map").unwrap();

        let mut config = base(dir.path());
        assert_eq!(config.map_path().unwrap(), dir.path().join("one.map"));

        config.map = "one.map".to_string();
        assert_eq!(config.map_path().unwrap(), dir.path().join("one.map"));

        config.map = "two.map".to_string();
        assert!(matches!(config.map_path(), Err(ConfigError::MapNotFound(_))));
    }

    #[test]
    fn random_map_needs_map_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            base(dir.path()).map_path(),
            Err(ConfigError::NoMaps(_))
        ));
    }
}
