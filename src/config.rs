//! Configuration management for TallyChain

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use crate::error::ChainError;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "tally.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub miner: MinerConfig,
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind_address: default_bind_address(),
            bootstrap_peers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Identity credited with mining rewards; random when unset.
    #[serde(default)]
    pub node_id: Option<String>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            node_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: default_peer_timeout_secs(),
        }
    }
}

impl ConsensusConfig {
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }
}

impl Config {
    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.miner.threads == 0 {
            return Err(ChainError::ConfigError(
                "miner.threads must be at least 1".to_string(),
            ));
        }

        if self.consensus.peer_timeout_secs == 0 {
            return Err(ChainError::ConfigError(
                "consensus.peer_timeout_secs must be at least 1".to_string(),
            ));
        }

        if matches!(&self.miner.node_id, Some(id) if id.trim().is_empty()) {
            return Err(ChainError::ConfigError(
                "miner.node_id must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load and validate the config at `path`. A missing file yields defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let config: Config = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => toml::from_str(&contents)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

fn default_api_port() -> u16 {
    5000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_threads() -> usize {
    1
}

fn default_peer_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.network.api_port, 5000);
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert!(config.network.bootstrap_peers.is_empty());
        assert_eq!(config.miner.threads, 1);
        assert!(config.miner.node_id.is_none());
        assert_eq!(config.consensus.peer_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[network]\napi_port = 5001\nbootstrap_peers = [\"http://127.0.0.1:5000\"]\n\n[miner]\nnode_id = \"alpha\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.network.api_port, 5001);
        assert_eq!(config.network.bootstrap_peers, vec!["http://127.0.0.1:5000"]);
        assert_eq!(config.miner.node_id.as_deref(), Some("alpha"));
        assert_eq!(config.miner.threads, 1);
        assert_eq!(config.consensus.peer_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nthreads = 0").unwrap();
        assert!(matches!(load_config(file.path()), Err(ChainError::ConfigError(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[consensus]\npeer_timeout_secs = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network\napi_port = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ChainError::ConfigError(_))));
    }
}
