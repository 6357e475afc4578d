//! Crop definitions and the validated lookup catalog.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ConfigError;

/// Static configuration for one plantable crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropType {
    /// Stable identifier used in save files and plant requests.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Glyph shown on a ready plot.
    pub glyph: String,
    /// Seconds from planting to ready.
    pub growth_secs: u64,
    /// Coins spent when planting.
    pub seed_cost: u64,
    /// Coins earned on an interactive harvest.
    pub sell_price: u64,
    /// Experience earned on any harvest, offline included.
    pub xp_reward: u64,
    /// Minimum player level required to plant.
    pub unlock_level: u32,
}

fn def(
    id: &str,
    name: &str,
    glyph: &str,
    growth_secs: u64,
    seed_cost: u64,
    sell_price: u64,
    xp_reward: u64,
    unlock_level: u32,
) -> CropType {
    CropType {
        id: id.to_string(),
        name: name.to_string(),
        glyph: glyph.to_string(),
        growth_secs,
        seed_cost,
        sell_price,
        xp_reward,
        unlock_level,
    }
}

static DEFAULT_CROPS: Lazy<Vec<CropType>> = Lazy::new(|| {
    vec![
        def("radish", "Radish", "🔴", 30, 10, 15, 10, 1),
        def("carrot", "Carrot", "🥕", 60, 20, 35, 15, 1),
        def("wheat", "Wheat", "🌾", 120, 30, 60, 25, 2),
        def("tomato", "Tomato", "🍅", 180, 50, 100, 40, 3),
        def("corn", "Corn", "🌽", 300, 80, 180, 70, 5),
        def("pumpkin", "Pumpkin", "🎃", 600, 150, 400, 150, 7),
    ]
});

/// Built-in balance table, used when the config file does not override it.
pub fn default_crops() -> Vec<CropType> {
    DEFAULT_CROPS.clone()
}

/// Validated, indexed crop table. Constructed once at startup; lookups are
/// by id for the rest of the process lifetime.
#[derive(Debug, Clone)]
pub struct Catalog {
    crops: Vec<CropType>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and index a crop table. Any violated rule is startup-fatal
    /// and is reported to the caller rather than silently patched.
    pub fn new(crops: Vec<CropType>) -> Result<Self, ConfigError> {
        if crops.is_empty() {
            return Err(ConfigError::EmptyCropTable);
        }

        let mut index = HashMap::with_capacity(crops.len());
        for (position, ty) in crops.iter().enumerate() {
            if ty.id.trim().is_empty() {
                return Err(ConfigError::BlankCropId { position });
            }
            if index.insert(ty.id.clone(), position).is_some() {
                return Err(ConfigError::DuplicateCrop { id: ty.id.clone() });
            }
            if ty.growth_secs == 0 {
                return Err(ConfigError::NonPositiveGrowth { id: ty.id.clone() });
            }
            if ty.seed_cost == 0 {
                return Err(ConfigError::NonPositiveCost { id: ty.id.clone() });
            }
            if ty.sell_price == 0 {
                return Err(ConfigError::NonPositivePrice { id: ty.id.clone() });
            }
            if ty.unlock_level == 0 {
                return Err(ConfigError::UnlockLevelZero { id: ty.id.clone() });
            }
            if ty.sell_price < ty.seed_cost {
                warn!(crop = %ty.id, "sell price below seed cost; planting it loses coins");
            }
        }

        Ok(Self { crops, index })
    }

    /// Look up a crop type by id.
    pub fn get(&self, id: &str) -> Option<&CropType> {
        self.index.get(id).map(|&position| &self.crops[position])
    }

    /// All crop types in table order.
    pub fn iter(&self) -> impl Iterator<Item = &CropType> {
        self.crops.iter()
    }

    /// Number of crop types in the catalog.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// True when the catalog holds no crop types. Cannot happen after
    /// construction, but the convention pairs with [`Catalog::len`].
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_validates() {
        let catalog = Catalog::new(default_crops()).expect("builtin crops must validate");
        assert_eq!(catalog.len(), 6);
        let radish = catalog.get("radish").expect("radish is builtin");
        assert_eq!(radish.growth_secs, 30);
        assert_eq!(radish.sell_price, 15);
        assert!(catalog.get("durian").is_none());
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = Catalog::new(Vec::new()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyCropTable);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut crops = default_crops();
        crops.push(crops[0].clone());
        let err = Catalog::new(crops).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateCrop {
                id: "radish".to_string()
            }
        );
    }

    #[test]
    fn zero_growth_is_rejected() {
        let mut crops = default_crops();
        crops[2].growth_secs = 0;
        let err = Catalog::new(crops).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositiveGrowth {
                id: "wheat".to_string()
            }
        );
    }

    #[test]
    fn zero_unlock_level_is_rejected() {
        let mut crops = default_crops();
        crops[0].unlock_level = 0;
        let err = Catalog::new(crops).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnlockLevelZero {
                id: "radish".to_string()
            }
        );
    }

    #[test]
    fn unprofitable_crop_is_a_warning_not_an_error() {
        let mut crops = default_crops();
        crops[0].sell_price = 1;
        assert!(Catalog::new(crops).is_ok());
    }
}
