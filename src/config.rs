use crate::domain::Address;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub rpc_url: String,
    pub position_manager: Address,
    pub factory: Address,
    pub exclusions: ExclusionSet,
    pub collect_fees_mode: CollectFeesMode,
    pub events_path: Option<String>,
}

/// Blocks and pools whose liquidity events are ignored.
///
/// Used to step around known-bad chain data without forking the handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    pub blocks: HashSet<u64>,
    pub pools: HashSet<Address>,
}

impl ExclusionSet {
    pub fn is_block_excluded(&self, block: u64) -> bool {
        self.blocks.contains(&block)
    }

    pub fn is_pool_excluded(&self, pool: &Address) -> bool {
        self.pools.contains(pool)
    }
}

/// How `Collect` credits the token1 fee accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectFeesMode {
    /// Credit the scaled token0 amount to both fee fields.
    #[default]
    Legacy,
    /// Credit amount1, scaled by token1's decimals, to the token1 fee field.
    Corrected,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = required(&env_map, "DATABASE_PATH")?;
        let rpc_url = required(&env_map, "RPC_URL")?;
        let position_manager = parse_address(&env_map, "POSITION_MANAGER_ADDRESS")?;
        let factory = parse_address(&env_map, "FACTORY_ADDRESS")?;

        let blocks = list(&env_map, "EXCLUDED_BLOCKS")
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "EXCLUDED_BLOCKS".to_string(),
                        format!("{} is not a block number", s),
                    )
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;

        let pools = list(&env_map, "EXCLUDED_POOLS")
            .map(|s| {
                Address::parse(s).map_err(|e| {
                    ConfigError::InvalidValue("EXCLUDED_POOLS".to_string(), format!("{}: {}", s, e))
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;

        let collect_fees_mode = match env_map
            .get("COLLECT_FEES_MODE")
            .map(|s| s.as_str())
            .unwrap_or("legacy")
        {
            "legacy" => CollectFeesMode::Legacy,
            "corrected" => CollectFeesMode::Corrected,
            other => {
                return Err(ConfigError::InvalidValue(
                    "COLLECT_FEES_MODE".to_string(),
                    format!("must be legacy or corrected, got {}", other),
                ))
            }
        };

        let events_path = env_map
            .get("EVENTS_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Config {
            database_path,
            rpc_url,
            position_manager,
            factory,
            exclusions: ExclusionSet { blocks, pools },
            collect_fees_mode,
            events_path,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_address(env_map: &HashMap<String, String>, key: &str) -> Result<Address, ConfigError> {
    let raw = required(env_map, key)?;
    Address::parse(&raw).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn list<'a>(env_map: &'a HashMap<String, String>, key: &str) -> impl Iterator<Item = &'a str> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
