//! Application configuration layered from defaults, an optional TOML file
//! under the user config directory, and `SPROUT__`-prefixed environment
//! variables.

use std::{fs, path::PathBuf};

use ::config::{Config, Environment, File};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{default_crops, CropType};

/// A violated startup rule. Fatal: the caller must refuse to launch and
/// report which rule failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// The crop table has no entries.
    #[error("crop table must not be empty")]
    EmptyCropTable,
    /// A crop entry has a blank id.
    #[error("crop #{position} has a blank id")]
    BlankCropId {
        /// Zero-based position in the table.
        position: usize,
    },
    /// Two crop entries share an id.
    #[error("crop `{id}` is defined twice")]
    DuplicateCrop {
        /// The duplicated id.
        id: String,
    },
    /// A crop's growth duration is zero.
    #[error("crop `{id}`: growth_secs must be positive")]
    NonPositiveGrowth {
        /// The offending crop.
        id: String,
    },
    /// A crop's seed cost is zero.
    #[error("crop `{id}`: seed_cost must be positive")]
    NonPositiveCost {
        /// The offending crop.
        id: String,
    },
    /// A crop's sell price is zero.
    #[error("crop `{id}`: sell_price must be positive")]
    NonPositivePrice {
        /// The offending crop.
        id: String,
    },
    /// A crop's unlock level is below one.
    #[error("crop `{id}`: unlock_level must be at least 1")]
    UnlockLevelZero {
        /// The offending crop.
        id: String,
    },
    /// The experience-per-level divisor is zero.
    #[error("xp_per_level must be positive")]
    NonPositiveXpPerLevel,
    /// The offline reward multiplier falls outside (0, 1].
    #[error("offline_multiplier must be within (0, 1], got {value}")]
    OfflineMultiplierOutOfRange {
        /// The rejected multiplier.
        value: f64,
    },
    /// The offline window cap is not positive.
    #[error("max_offline_secs must be positive, got {value}")]
    NonPositiveOfflineCap {
        /// The rejected cap.
        value: f64,
    },
    /// The farm grid has a zero dimension.
    #[error("farm must be at least 1x1, got {width}x{height}")]
    DegenerateFarm {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The auto-save interval is zero.
    #[error("autosave_secs must be positive")]
    NonPositiveAutosave,
}

/// Reward and progression constants shared by live play and offline
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Experience consumed per level; level is derived as
    /// `experience / xp_per_level + 1`.
    pub xp_per_level: u64,
    /// Fraction of the sell price credited by an offline auto-harvest.
    pub offline_multiplier: f64,
    /// Longest offline window reported to the player, in seconds.
    pub max_offline_secs: f64,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            xp_per_level: 100,
            offline_multiplier: 0.7,
            max_offline_secs: 86_400.0,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit save file location; defaults to the user config directory.
    pub save_file: Option<PathBuf>,
    /// Seconds between periodic auto-saves.
    pub autosave_secs: u64,
    /// Farm grid width for a new game.
    pub farm_width: u32,
    /// Farm grid height for a new game.
    pub farm_height: u32,
    /// Coins a new player starts with.
    pub starting_coins: u64,
    /// Progression and offline-reward constants.
    pub balance: Balance,
    /// Crop table; replaces the builtin one entirely when set.
    pub crops: Vec<CropType>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_file: None,
            autosave_secs: 30,
            farm_width: 4,
            farm_height: 4,
            starting_coins: 100,
            balance: Balance::default(),
            crops: default_crops(),
        }
    }
}

/// Root directory for sprout's own files under the user config dir.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sprout")
}

/// Default location of the TOML config file.
pub fn config_path() -> PathBuf {
    config_root().join("config.toml")
}

const DEFAULT_CONFIG_TOML: &str = r#"# sprout configuration
#
# Every setting is optional; removing a line falls back to the default.
# Environment variables prefixed with SPROUT__ override this file,
# e.g. SPROUT__AUTOSAVE_SECS=60.

# Seconds between periodic auto-saves.
#autosave_secs = 30

# Farm grid for a new game.
#farm_width = 4
#farm_height = 4

# Coins a new player starts with.
#starting_coins = 100

# Explicit save file location.
#save_file = "/home/me/.local/farm/savegame.json"

#[balance]
#xp_per_level = 100
# Fraction of the sell price credited by an offline auto-harvest.
#offline_multiplier = 0.7
# Longest offline window reported to the player (24h).
#max_offline_secs = 86400

# Defining any [[crops]] entry replaces the builtin table entirely.
#[[crops]]
#id = "radish"
#name = "Radish"
#glyph = "🔴"
#growth_secs = 30
#seed_cost = 10
#sell_price = 15
#xp_reward = 10
#unlock_level = 1
"#;

/// Write a commented starter config on first launch. Existing files are
/// left untouched.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write {}", path.display()))
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from an explicit file path (missing files are
    /// fine) plus the environment.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.into()).required(false))
            .add_source(
                Environment::with_prefix("SPROUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble configuration")?;
        settings
            .try_deserialize::<AppConfig>()
            .context("failed to parse configuration")
    }

    /// Where the save file lives; the engine itself never computes this.
    pub fn save_path(&self) -> PathBuf {
        self.save_file
            .clone()
            .unwrap_or_else(|| config_root().join("savegame.json"))
    }

    /// Check the non-catalog startup rules. The crop table is validated
    /// separately when the [`crate::catalog::Catalog`] is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.farm_width == 0 || self.farm_height == 0 {
            return Err(ConfigError::DegenerateFarm {
                width: self.farm_width,
                height: self.farm_height,
            });
        }
        if self.autosave_secs == 0 {
            return Err(ConfigError::NonPositiveAutosave);
        }
        if self.balance.xp_per_level == 0 {
            return Err(ConfigError::NonPositiveXpPerLevel);
        }
        let multiplier = self.balance.offline_multiplier;
        if !(multiplier > 0.0 && multiplier <= 1.0) {
            return Err(ConfigError::OfflineMultiplierOutOfRange { value: multiplier });
        }
        if !(self.balance.max_offline_secs > 0.0) {
            return Err(ConfigError::NonPositiveOfflineCap {
                value: self.balance.max_offline_secs,
            });
        }
        Ok(())
    }
}
