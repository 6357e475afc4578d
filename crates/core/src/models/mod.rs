//! Runtime game entities.

pub mod crop;
pub mod farm;
pub mod player;

pub use crop::{format_remaining, progress_bar, unix_now, Crop, GrowthStage, Timestamp};
pub use farm::Farm;
pub use player::Player;
