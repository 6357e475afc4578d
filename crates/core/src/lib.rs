#![warn(clippy::all, missing_docs)]

//! Core domain logic for the sprout farming game.
//!
//! This crate hosts the crop lifecycle model, the farm grid and player
//! ledger, the offline reconciliation engine, configuration handling,
//! and save-file persistence used by the terminal UI and any future
//! frontends. Every temporal rule takes an explicit `now`, so the whole
//! crate is testable without waiting on a clock.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod save;
pub mod session;

pub use catalog::{default_crops, Catalog, CropType};
pub use config::{AppConfig, Balance, ConfigError};
pub use error::GameError;
pub use models::{
    format_remaining, progress_bar, unix_now, Crop, Farm, GrowthStage, Player, Timestamp,
};
pub use reconcile::{reconcile, AutoHarvest, ReconcileReport};
pub use save::{LoadOutcome, LoadSource, SaveManager, SAVE_VERSION};
pub use session::{GameSession, HarvestOutcome};
