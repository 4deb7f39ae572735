//! Configuration and key storage for the zeroxmr CLI

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use settlement::crypto::{ByteOrder, TxTreeConvention};

use crate::crypto::{Network, WalletKeys};

/// Default directory under the home directory
const ZEROXMR_DIR: &str = ".zeroxmr";
const CONFIG_FILE: &str = "config.json";
const KEYS_FILE: &str = "keys.json";

/// Default Merkle depth limit, matching the ledger default
pub const DEFAULT_MAX_MERKLE_DEPTH: usize = 32;

/// Proof-construction settings; must match the ledger being targeted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub network: Network,
    /// Byte order of encoded points and scalars in proofs
    pub byte_order: ByteOrder,
    /// How block transaction trees are assembled
    pub tx_tree: TxTreeConvention,
    pub max_merkle_depth: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            byte_order: ByteOrder::BigEndian,
            tx_tree: TxTreeConvention::default(),
            max_merkle_depth: DEFAULT_MAX_MERKLE_DEPTH,
        }
    }
}

/// Stored wallet keys (plaintext, 0600 on unix)
#[derive(Serialize, Deserialize, Clone)]
pub struct StoredKeys {
    /// Spend secret key (hex encoded)
    pub spend_secret: String,
    /// View secret key (hex encoded)
    pub view_secret: String,
    pub spend_pubkey: String,
    pub view_pubkey: String,
    pub network: Network,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl Drop for StoredKeys {
    fn drop(&mut self) {
        self.spend_secret.zeroize();
        self.view_secret.zeroize();
    }
}

impl StoredKeys {
    pub fn from_wallet(keys: &WalletKeys, network: Network) -> Self {
        let (mut spend, mut view) = keys.export_secrets();
        let stored = Self {
            spend_secret: hex::encode(spend),
            view_secret: hex::encode(view),
            spend_pubkey: hex::encode(keys.spend_public),
            view_pubkey: hex::encode(keys.view_public),
            network,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        spend.zeroize();
        view.zeroize();
        stored
    }

    /// Rebuild the wallet and check the stored public keys still match
    pub fn to_wallet(&self) -> Result<WalletKeys> {
        let mut spend = parse_hex32(&self.spend_secret).context("Corrupt spend secret")?;
        let mut view = parse_hex32(&self.view_secret).context("Corrupt view secret")?;
        let keys = WalletKeys::from_secrets(&spend, &view);
        spend.zeroize();
        view.zeroize();

        if hex::encode(keys.spend_public) != self.spend_pubkey
            || hex::encode(keys.view_public) != self.view_pubkey
        {
            bail!("Stored public keys do not match the stored secrets");
        }
        Ok(keys)
    }
}

/// Locations of the config and key files
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.zeroxmr`, or `override_root` when given
    pub fn resolve(override_root: Option<PathBuf>) -> Result<Self> {
        match override_root {
            Some(root) => Ok(Self::new(root)),
            None => {
                let home = dirs::home_dir().context("Could not find home directory")?;
                Ok(Self::new(home.join(ZEROXMR_DIR)))
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn keys_file(&self) -> PathBuf {
        self.root.join(KEYS_FILE)
    }

    pub fn keys_exist(&self) -> bool {
        self.keys_file().exists()
    }
}

/// Load the config, falling back to defaults when none was saved
pub fn load_config(paths: &Paths) -> Result<CliConfig> {
    let path = paths.config_file();
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let json = fs::read_to_string(&path).context("Failed to read config file")?;
    let config: CliConfig = serde_json::from_str(&json).context("Failed to parse config file")?;
    if config.max_merkle_depth == 0 {
        bail!("max_merkle_depth must be at least 1");
    }
    Ok(config)
}

pub fn save_config(paths: &Paths, config: &CliConfig) -> Result<()> {
    fs::create_dir_all(paths.root()).context("Failed to create zeroxmr directory")?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(paths.config_file(), json).context("Failed to write config file")?;
    Ok(())
}

/// Save keys to disk
pub fn save_keys(paths: &Paths, keys: &StoredKeys) -> Result<()> {
    fs::create_dir_all(paths.root()).context("Failed to create zeroxmr directory")?;

    let path = paths.keys_file();
    let mut json = serde_json::to_string_pretty(keys)?;
    fs::write(&path, &json)?;
    json.zeroize();

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Load keys from disk
pub fn load_keys(paths: &Paths) -> Result<StoredKeys> {
    let path = paths.keys_file();
    if !path.exists() {
        bail!("No wallet keys found. Run 'zeroxmr keygen' first.");
    }

    let json = fs::read_to_string(&path).context("Failed to read keys file")?;
    let keys: StoredKeys = serde_json::from_str(&json).context("Failed to parse keys file")?;

    Ok(keys)
}

/// Parse 32 hex-encoded bytes, with or without a `0x` prefix
pub fn parse_hex32(input: &str) -> Result<[u8; 32]> {
    let trimmed = input.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).with_context(|| format!("Invalid hex: {input}"))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| anyhow::anyhow!("Expected 32 bytes, got {}", bytes.len()))
}

/// Parse 8 hex-encoded bytes (an encrypted amount)
pub fn parse_hex8(input: &str) -> Result<[u8; 8]> {
    let trimmed = input.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).with_context(|| format!("Invalid hex: {input}"))?;
    <[u8; 8]>::try_from(bytes.as_slice())
        .map_err(|_| anyhow::anyhow!("Expected 8 bytes, got {}", bytes.len()))
}
