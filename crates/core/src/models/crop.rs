//! A single planted crop. All temporal state is derived from the stored
//! planting timestamp; nothing here ticks or mutates on its own.

use crate::catalog::CropType;
use crate::error::GameError;

/// Unix time in seconds. Fractions are preserved end to end.
pub type Timestamp = f64;

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> Timestamp {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Visual growth stage, derived from progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStage {
    /// Just planted.
    Planted,
    /// First shoots.
    Sprouting,
    /// Bulk of the growth.
    Growing,
    /// Almost there.
    Flowering,
    /// Elapsed time has reached the growth duration.
    Ready,
}

impl GrowthStage {
    fn from_progress(progress: f64) -> Self {
        if progress < 0.2 {
            GrowthStage::Planted
        } else if progress < 0.4 {
            GrowthStage::Sprouting
        } else if progress < 0.6 {
            GrowthStage::Growing
        } else {
            GrowthStage::Flowering
        }
    }

    /// Glyph for this stage.
    pub fn glyph(self) -> &'static str {
        match self {
            GrowthStage::Planted => "🌱",
            GrowthStage::Sprouting => "🌿",
            GrowthStage::Growing => "🪴",
            GrowthStage::Flowering => "🌺",
            GrowthStage::Ready => "✨",
        }
    }

    /// Human-readable stage name.
    pub fn label(self) -> &'static str {
        match self {
            GrowthStage::Planted => "Planted",
            GrowthStage::Sprouting => "Sprouting",
            GrowthStage::Growing => "Growing",
            GrowthStage::Flowering => "Flowering",
            GrowthStage::Ready => "Ready",
        }
    }
}

/// A planted seed occupying one farm plot. Read-only between planting and
/// harvest; owned exclusively by its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    kind: String,
    planted_at: Timestamp,
}

impl Crop {
    /// Plant a crop of the given type at `now`.
    pub fn plant(ty: &CropType, now: Timestamp) -> Result<Self, GameError> {
        Self::restore(ty.id.clone(), now)
    }

    /// Rebuild a crop from persisted fields.
    pub(crate) fn restore(kind: String, planted_at: Timestamp) -> Result<Self, GameError> {
        if !planted_at.is_finite() || planted_at < 0.0 {
            return Err(GameError::InvalidTimestamp {
                seconds: planted_at,
            });
        }
        Ok(Self { kind, planted_at })
    }

    /// Catalog id of the planted crop type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Unix timestamp the crop was planted at.
    pub fn planted_at(&self) -> Timestamp {
        self.planted_at
    }

    /// Seconds grown so far. Clamped at zero so a clock rollback can never
    /// produce negative growth.
    pub fn elapsed(&self, now: Timestamp) -> f64 {
        (now - self.planted_at).max(0.0)
    }

    /// Growth progress in `[0, 1]`; non-decreasing in `now`.
    pub fn progress(&self, ty: &CropType, now: Timestamp) -> f64 {
        (self.elapsed(now) / ty.growth_secs as f64).clamp(0.0, 1.0)
    }

    /// Whether the crop can be harvested. Monotonic: once true for a given
    /// `now` it stays true for every later `now`.
    pub fn is_ready(&self, ty: &CropType, now: Timestamp) -> bool {
        self.elapsed(now) >= ty.growth_secs as f64
    }

    /// Seconds until ready, zero once ready.
    pub fn remaining_secs(&self, ty: &CropType, now: Timestamp) -> f64 {
        (ty.growth_secs as f64 - self.elapsed(now)).max(0.0)
    }

    /// Visual stage for display.
    pub fn stage(&self, ty: &CropType, now: Timestamp) -> GrowthStage {
        if self.is_ready(ty, now) {
            GrowthStage::Ready
        } else {
            GrowthStage::from_progress(self.progress(ty, now))
        }
    }
}

/// Human-readable countdown: `"Ready!"`, `"45s"`, `"2m 15s"`, `"1h 5m"`.
pub fn format_remaining(secs: f64) -> String {
    if secs <= 0.0 {
        return "Ready!".to_string();
    }
    let secs = secs.ceil() as u64;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let minutes = secs / 60;
        let seconds = secs % 60;
        if seconds > 0 {
            format!("{minutes}m {seconds}s")
        } else {
            format!("{minutes}m")
        }
    } else {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        }
    }
}

/// Fixed-width textual progress bar.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).floor() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..width {
        bar.push('░');
    }
    bar
}
