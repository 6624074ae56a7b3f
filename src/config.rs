use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ChainError, ChainResult};

/// Number of immutable validator slots seeded at genesis.
pub const GENESIS_VALIDATOR_SLOTS: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub rpc_listen: SocketAddr,
    pub genesis: GenesisConfig,
}

impl NodeConfig {
    pub fn load(path: &Path) -> ChainResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|err| ChainError::Config(format!("unable to parse config: {err}")))
    }

    pub fn save(&self, path: &Path) -> ChainResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| ChainError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> ChainResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            rpc_listen: "127.0.0.1:7070".parse().expect("valid socket addr"),
            genesis: GenesisConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub chain_id: String,
    /// The super-admin seeded at genesis; exempt from freeze/activate/logout.
    pub super_admin: String,
    /// Additional governance admins active from genesis.
    #[serde(default)]
    pub admins: Vec<String>,
    /// The four immutable genesis validator slots.
    pub validators: Vec<GenesisValidator>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            chain_id: "govchain-local".to_string(),
            super_admin: "0x0000000000000000000000000000000000000001".to_string(),
            admins: Vec::new(),
            validators: (0..GENESIS_VALIDATOR_SLOTS as u64)
                .map(|slot| GenesisValidator {
                    account: format!("0x000000000000000000000000000000000000001{slot}"),
                    name: format!("genesis-{slot}"),
                    pid: format!("peer-genesis-{slot}"),
                })
                .collect(),
        }
    }
}

impl GenesisConfig {
    /// Genesis state is the trust anchor for everything the controller
    /// enforces later, so it is validated before any record is written.
    pub fn validate(&self) -> ChainResult<()> {
        if self.super_admin.is_empty() {
            return Err(ChainError::Config("genesis super admin is empty".into()));
        }
        if self.validators.len() != GENESIS_VALIDATOR_SLOTS {
            return Err(ChainError::Config(format!(
                "genesis requires exactly {GENESIS_VALIDATOR_SLOTS} validator slots, found {}",
                self.validators.len()
            )));
        }
        for (index, validator) in self.validators.iter().enumerate() {
            if validator.account.is_empty() || validator.pid.is_empty() || validator.name.is_empty()
            {
                return Err(ChainError::Config(format!(
                    "genesis validator slot {index} is incomplete"
                )));
            }
            for other in &self.validators[index + 1..] {
                if other.account == validator.account
                    || other.pid == validator.pid
                    || other.name == validator.name
                {
                    return Err(ChainError::Config(format!(
                        "genesis validator slot {index} duplicates another slot"
                    )));
                }
            }
        }
        if self.admins.iter().any(|admin| admin == &self.super_admin) {
            return Err(ChainError::Config(
                "genesis admin list repeats the super admin".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub account: String,
    pub name: String,
    pub pid: String,
}
