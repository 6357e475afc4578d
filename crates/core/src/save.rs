//! Save-file persistence and the load-time reconciliation entry point.
//!
//! A save is a full-state overwrite written atomically (temp file, then
//! rename), so the previous file stays valid until the new one lands.
//! Loading never fails: missing or corrupt files fall back to a freshly
//! initialised game.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::{AppConfig, Balance};
use crate::models::crop::{Crop, Timestamp};
use crate::models::farm::Farm;
use crate::models::player::Player;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::session::GameSession;

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Versioned on-disk envelope. Every field defaults so older and newer
/// files load without errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveState {
    /// Format version the file was written with.
    pub version: u32,
    /// Unix seconds of the write; the reconciliation window starts here.
    pub last_save: f64,
    /// Serialized farm grid.
    pub farm: FarmState,
    /// Serialized player ledger.
    pub player: PlayerState,
}

/// Serialized farm grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmState {
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Occupied plots only.
    pub plots: Vec<PlotState>,
}

/// One occupied plot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotState {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Catalog id of the planted crop.
    pub crop_type: String,
    /// Unix seconds the crop was planted at.
    pub planted_at: f64,
}

/// Serialized player ledger. The level is written for display and
/// compatibility but re-derived from experience on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    /// Coins held.
    pub coins: u64,
    /// Total accumulated experience.
    pub experience: u64,
    /// Derived level at write time.
    pub level: u32,
    /// Lifetime seeds planted.
    pub crops_planted: u64,
    /// Lifetime harvests.
    pub crops_harvested: u64,
}

/// How the loaded state came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// No save file existed; a new game was initialised.
    Fresh,
    /// The save file parsed and was restored.
    Restored,
    /// The save file was unreadable; a new game replaced it.
    Recovered,
}

/// Everything the caller gets back from a load.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Live state, reconciliation already applied.
    pub session: GameSession,
    /// What happened during the offline window.
    pub report: ReconcileReport,
    /// Where the state came from.
    pub source: LoadSource,
}

/// Reads and writes the save file at a fixed path chosen by the caller.
pub struct SaveManager {
    path: PathBuf,
}

impl SaveManager {
    /// Create a manager for the given save file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The save file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full state. The write goes to a temp file in the same
    /// directory first and is renamed over the target, so a crash mid-write
    /// leaves the previous save intact.
    pub fn save(&self, session: &GameSession, balance: &Balance, now: Timestamp) -> Result<()> {
        let state = snapshot(session, balance, now);
        let serialized =
            serde_json::to_vec_pretty(&state).context("failed to serialize save state")?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let mut temp = NamedTempFile::new_in(parent)
            .context("failed to create temporary save file")?;
        temp.write_all(&serialized)
            .context("failed to write save state")?;
        temp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Load the save, run the reconciliation pass exactly once, and hand
    /// back live state. Corruption is recovered locally: the player loses
    /// the broken save but the process starts every time.
    pub fn load(&self, config: &AppConfig, catalog: &Catalog, now: Timestamp) -> LoadOutcome {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no save file; starting a new game");
            return LoadOutcome {
                session: GameSession::new_game(config),
                report: ReconcileReport::default(),
                source: LoadSource::Fresh,
            };
        }

        let state = match self.read_state() {
            Ok(state) => state,
            Err(err) => {
                warn!(%err, path = %self.path.display(), "save file unreadable; starting over");
                return LoadOutcome {
                    session: GameSession::new_game(config),
                    report: ReconcileReport::default(),
                    source: LoadSource::Recovered,
                };
            }
        };

        let mut session = rebuild(&state, config, catalog);
        let report = reconcile(
            &mut session.farm,
            &mut session.player,
            catalog,
            &config.balance,
            state.last_save,
            now,
        );
        LoadOutcome {
            session,
            report,
            source: LoadSource::Restored,
        }
    }

    fn read_state(&self) -> Result<SaveState> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(state)
    }
}

fn snapshot(session: &GameSession, balance: &Balance, now: Timestamp) -> SaveState {
    let player = &session.player;
    SaveState {
        version: SAVE_VERSION,
        last_save: now,
        farm: FarmState {
            width: session.farm.width(),
            height: session.farm.height(),
            plots: session
                .farm
                .crops()
                .map(|((x, y), crop)| PlotState {
                    x,
                    y,
                    crop_type: crop.kind().to_string(),
                    planted_at: crop.planted_at(),
                })
                .collect(),
        },
        player: PlayerState {
            coins: player.coins(),
            experience: player.experience(),
            level: player.level(balance.xp_per_level),
            crops_planted: player.crops_planted(),
            crops_harvested: player.crops_harvested(),
        },
    }
}

fn rebuild(state: &SaveState, config: &AppConfig, catalog: &Catalog) -> GameSession {
    if state.version > SAVE_VERSION {
        warn!(
            version = state.version,
            "save is from a newer build; loading best-effort"
        );
    }

    let (width, height) = if state.farm.width == 0 || state.farm.height == 0 {
        warn!("save has a degenerate farm grid; using the configured size");
        (config.farm_width, config.farm_height)
    } else {
        (state.farm.width, state.farm.height)
    };

    let mut farm = Farm::new(width, height);
    for plot in &state.farm.plots {
        if catalog.get(&plot.crop_type).is_none() {
            warn!(
                crop = %plot.crop_type,
                x = plot.x,
                y = plot.y,
                "dropping plot with a crop type missing from the catalog"
            );
            continue;
        }
        let crop = match Crop::restore(plot.crop_type.clone(), plot.planted_at) {
            Ok(crop) => crop,
            Err(err) => {
                warn!(%err, x = plot.x, y = plot.y, "dropping plot");
                continue;
            }
        };
        if let Err(err) = farm.place(plot.x, plot.y, crop) {
            warn!(%err, x = plot.x, y = plot.y, "dropping plot");
        }
    }

    let player = Player::restore(
        state.player.coins,
        state.player.experience,
        state.player.crops_planted,
        state.player.crops_harvested,
    );
    GameSession::from_parts(farm, player)
}
