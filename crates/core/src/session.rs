//! Live game state: one farm and one player, owned together and mutated
//! from a single control flow.

use crate::catalog::Catalog;
use crate::config::{AppConfig, Balance};
use crate::error::GameError;
use crate::models::crop::{Crop, Timestamp};
use crate::models::farm::Farm;
use crate::models::player::Player;

/// Result of a successful interactive harvest.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestOutcome {
    /// Display name of the harvested crop.
    pub crop: String,
    /// Coins credited at the full sell price.
    pub coins: u64,
    /// Experience credited.
    pub xp: u64,
    /// Levels gained by this harvest.
    pub levels_gained: u32,
}

/// The explicitly owned farm + player pair. There is no ambient global:
/// the pair is created at load, threaded through the interactive loop,
/// and handed to the persistence layer at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    /// The plot grid.
    pub farm: Farm,
    /// The economic ledger.
    pub player: Player,
}

impl GameSession {
    /// Fresh state for a brand-new game.
    pub fn new_game(config: &AppConfig) -> Self {
        Self {
            farm: Farm::new(config.farm_width, config.farm_height),
            player: Player::new(config.starting_coins),
        }
    }

    /// Rebuild a session from restored parts.
    pub(crate) fn from_parts(farm: Farm, player: Player) -> Self {
        Self { farm, player }
    }

    /// Buy a seed and plant it at `(x, y)`. Every check runs before any
    /// state moves, so a refused plant leaves both the slot and the coin
    /// ledger exactly as they were.
    pub fn plant(
        &mut self,
        x: u32,
        y: u32,
        kind: &str,
        catalog: &Catalog,
        balance: &Balance,
        now: Timestamp,
    ) -> Result<&Crop, GameError> {
        let ty = catalog.get(kind).ok_or_else(|| GameError::UnknownCrop {
            id: kind.to_string(),
        })?;
        if !self.player.has_unlocked(ty, balance.xp_per_level) {
            return Err(GameError::CropLocked {
                name: ty.name.clone(),
                required: ty.unlock_level,
            });
        }
        let seed = Crop::plant(ty, now)?;
        self.farm.ensure_vacant(x, y)?;
        self.player.spend(ty.seed_cost)?;
        self.farm.place(x, y, seed)?;
        self.player.record_planted();
        self.farm.crop_at(x, y).ok_or(GameError::EmptySlot { x, y })
    }

    /// Harvest a ready crop at `(x, y)` and credit the player with the
    /// full sell price and experience reward.
    pub fn harvest(
        &mut self,
        x: u32,
        y: u32,
        catalog: &Catalog,
        balance: &Balance,
        now: Timestamp,
    ) -> Result<HarvestOutcome, GameError> {
        let crop = self.farm.harvest(x, y, catalog, now)?;
        let ty = catalog
            .get(crop.kind())
            .ok_or_else(|| GameError::UnknownCrop {
                id: crop.kind().to_string(),
            })?;
        let levels_gained = self
            .player
            .earn(ty.sell_price, ty.xp_reward, balance.xp_per_level);
        self.player.record_harvested();
        Ok(HarvestOutcome {
            crop: ty.name.clone(),
            coins: ty.sell_price,
            xp: ty.xp_reward,
            levels_gained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_crops;

    fn setup() -> (GameSession, Catalog, Balance, AppConfig) {
        let config = AppConfig::default();
        let catalog = Catalog::new(default_crops()).expect("builtin crops must validate");
        let balance = config.balance.clone();
        (GameSession::new_game(&config), catalog, balance, config)
    }

    #[test]
    fn radish_lifecycle_end_to_end() {
        let (mut session, catalog, balance, _config) = setup();
        assert_eq!(session.player.coins(), 100);

        let kind = session
            .plant(0, 0, "radish", &catalog, &balance, 0.0)
            .expect("plot is free and radish is unlocked")
            .kind()
            .to_string();
        assert_eq!(kind, "radish");
        assert_eq!(session.player.coins(), 90);
        assert_eq!(session.player.crops_planted(), 1);

        let radish = catalog.get("radish").expect("builtin");
        let planted = session.farm.crop_at(0, 0).expect("planted");
        assert!(!planted.is_ready(radish, 29.0));
        assert!(planted.is_ready(radish, 30.0));

        assert_eq!(
            session.harvest(0, 0, &catalog, &balance, 29.0),
            Err(GameError::CropNotReady { remaining_secs: 1 })
        );

        let outcome = session
            .harvest(0, 0, &catalog, &balance, 30.0)
            .expect("ready at exactly the growth duration");
        assert_eq!(
            outcome,
            HarvestOutcome {
                crop: "Radish".to_string(),
                coins: 15,
                xp: 10,
                levels_gained: 0
            }
        );
        assert_eq!(session.player.coins(), 105);
        assert_eq!(session.player.experience(), 10);
        assert!(session.farm.crop_at(0, 0).is_none());
    }

    #[test]
    fn insufficient_funds_changes_nothing() {
        let (mut session, catalog, balance, config) = setup();
        let mut poor = GameSession::new_game(&AppConfig {
            starting_coins: 5,
            ..config
        });

        assert_eq!(
            poor.plant(0, 0, "radish", &catalog, &balance, 0.0),
            Err(GameError::InsufficientFunds {
                needed: 10,
                available: 5
            })
        );
        assert!(poor.farm.crop_at(0, 0).is_none());
        assert_eq!(poor.player.coins(), 5);
        assert_eq!(poor.player.crops_planted(), 0);

        // The default session can afford it just fine.
        session
            .plant(0, 0, "radish", &catalog, &balance, 0.0)
            .expect("affordable");
    }

    #[test]
    fn locked_crops_are_refused_before_spending() {
        let (mut session, catalog, balance, _config) = setup();
        assert_eq!(
            session.plant(0, 0, "pumpkin", &catalog, &balance, 0.0),
            Err(GameError::CropLocked {
                name: "Pumpkin".to_string(),
                required: 7
            })
        );
        assert_eq!(session.player.coins(), 100);
        assert!(session.farm.crop_at(0, 0).is_none());
    }

    #[test]
    fn unknown_crop_ids_are_refused() {
        let (mut session, catalog, balance, _config) = setup();
        assert_eq!(
            session.plant(0, 0, "durian", &catalog, &balance, 0.0),
            Err(GameError::UnknownCrop {
                id: "durian".to_string()
            })
        );
    }

    #[test]
    fn occupied_plot_charges_nothing_extra() {
        let (mut session, catalog, balance, _config) = setup();
        session
            .plant(0, 0, "radish", &catalog, &balance, 0.0)
            .expect("first plant");
        assert_eq!(session.player.coins(), 90);

        assert_eq!(
            session.plant(0, 0, "radish", &catalog, &balance, 1.0),
            Err(GameError::SlotOccupied { x: 0, y: 0 })
        );
        assert_eq!(session.player.coins(), 90, "refusal must not charge");
    }

    #[test]
    fn harvest_reward_can_level_up() {
        let (mut session, catalog, mut balance, _config) = setup();
        balance.xp_per_level = 10;

        session
            .plant(0, 0, "radish", &catalog, &balance, 0.0)
            .expect("plot is free");
        let outcome = session
            .harvest(0, 0, &catalog, &balance, 30.0)
            .expect("ready");
        assert_eq!(outcome.levels_gained, 1);
        assert_eq!(session.player.level(balance.xp_per_level), 2);
    }
}
