use std::{
    env, fs, io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_ARBITER_CONFIG: &str = include_str!("data/arbiter_config.json");

/// Tunables for the loot arbiter and its server surface.
#[derive(Resource, Debug, Clone)]
pub struct ArbiterConfig {
    /// How long a corpse-loot contest stays open waiting for more candidates.
    pub admission_window_ms: u64,
    /// Upper bound of the uniform dice draw (inclusive).
    pub max_dice: u32,
    /// Resolved sessions are evicted this long after the winner was recorded.
    pub resolved_ttl_ms: u64,
    /// Never-resolved sessions are evicted this long after creation.
    pub stale_ttl_ms: u64,
    /// Dice RNG seed; 0 seeds from entropy.
    pub rng_seed: u64,
    pub notice_bind: SocketAddr,
    pub command_bind: SocketAddr,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            admission_window_ms: 15_000,
            max_dice: 1_000,
            resolved_ttl_ms: 300_000,
            stale_ttl_ms: 3_600_000,
            rng_seed: 0,
            notice_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42100),
            command_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42101),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArbiterConfigFile {
    #[serde(default = "default_admission_window_ms")]
    pub admission_window_ms: u64,
    #[serde(default = "default_max_dice")]
    pub max_dice: u32,
    #[serde(default = "default_resolved_ttl_ms")]
    pub resolved_ttl_ms: u64,
    #[serde(default = "default_stale_ttl_ms")]
    pub stale_ttl_ms: u64,
    #[serde(default)]
    pub rng_seed: u64,
    #[serde(default = "default_notice_bind")]
    pub notice_bind: SocketAddr,
    #[serde(default = "default_command_bind")]
    pub command_bind: SocketAddr,
}

fn default_admission_window_ms() -> u64 {
    15_000
}

fn default_max_dice() -> u32 {
    1_000
}

fn default_resolved_ttl_ms() -> u64 {
    300_000
}

fn default_stale_ttl_ms() -> u64 {
    3_600_000
}

fn default_notice_bind() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42100)
}

fn default_command_bind() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42101)
}

impl From<ArbiterConfigFile> for ArbiterConfig {
    fn from(file: ArbiterConfigFile) -> Self {
        Self {
            admission_window_ms: file.admission_window_ms,
            max_dice: file.max_dice.max(1),
            resolved_ttl_ms: file.resolved_ttl_ms,
            stale_ttl_ms: file.stale_ttl_ms,
            rng_seed: file.rng_seed,
            notice_bind: file.notice_bind,
            command_bind: file.command_bind,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArbiterConfigError {
    #[error("failed to parse arbiter config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read arbiter config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load the arbiter config, honouring a `LOOT_CONFIG_PATH` override and
/// falling back to the builtin defaults when the file is missing or broken.
pub fn load_arbiter_config_from_env() -> ArbiterConfig {
    if let Some(path) = env::var("LOOT_CONFIG_PATH").ok().map(PathBuf::from) {
        match read_arbiter_config_from_file(&path) {
            Ok(config) => return config,
            Err(err) => {
                tracing::warn!(
                    target: "gravemark::config",
                    path = %path.display(),
                    error = %err,
                    "arbiter_config.load_failed"
                );
            }
        }
    }

    read_arbiter_config_from_str(BUILTIN_ARBITER_CONFIG)
        .expect("builtin arbiter config should parse")
}

fn read_arbiter_config_from_file(path: &Path) -> Result<ArbiterConfig, ArbiterConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ArbiterConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_arbiter_config_from_str(&contents)
}

fn read_arbiter_config_from_str(data: &str) -> Result<ArbiterConfig, ArbiterConfigError> {
    let file: ArbiterConfigFile = serde_json::from_str(data)?;
    Ok(file.into())
}
