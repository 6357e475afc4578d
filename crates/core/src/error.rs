//! Typed refusals returned by model and engine operations.

use thiserror::Error;

/// Expected, caller-handled failures. None of these should ever crash the
/// process; the frontend surfaces them and the operation is simply refused.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GameError {
    /// A timestamp was negative or not a finite number.
    #[error("invalid timestamp {seconds}")]
    InvalidTimestamp {
        /// The offending unix-seconds value.
        seconds: f64,
    },
    /// The coordinate lies outside the farm grid.
    #[error("plot ({x}, {y}) is outside the farm")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// The slot already holds a crop; plots are never overwritten.
    #[error("plot ({x}, {y}) already has a crop")]
    SlotOccupied {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// Harvest was requested on a vacant slot.
    #[error("plot ({x}, {y}) is empty")]
    EmptySlot {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// The crop has not finished growing yet.
    #[error("crop not ready ({remaining_secs}s left)")]
    CropNotReady {
        /// Whole seconds until the crop is ready, rounded up.
        remaining_secs: u64,
    },
    /// The player cannot afford the requested purchase.
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientFunds {
        /// Cost of the purchase.
        needed: u64,
        /// Coins currently held.
        available: u64,
    },
    /// The crop type exists but the player has not reached its unlock level.
    #[error("{name} unlocks at level {required}")]
    CropLocked {
        /// Display name of the crop.
        name: String,
        /// Level required to plant it.
        required: u32,
    },
    /// The requested crop id is not in the catalog.
    #[error("unknown crop type `{id}`")]
    UnknownCrop {
        /// The id that failed to resolve.
        id: String,
    },
}
