//! Player ledger: coins, experience, and progression derived from them.

use crate::catalog::{Catalog, CropType};
use crate::error::GameError;

/// Economic and progression state for the (single) player.
///
/// Level is never stored: it is always derived from total accumulated
/// experience, so replays and retroactive balance changes cannot desync it.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    coins: u64,
    experience: u64,
    crops_planted: u64,
    crops_harvested: u64,
}

impl Player {
    /// Fresh player with the configured starting coins.
    pub fn new(starting_coins: u64) -> Self {
        Self {
            coins: starting_coins,
            experience: 0,
            crops_planted: 0,
            crops_harvested: 0,
        }
    }

    /// Rebuild a player from persisted fields. Any stored level is ignored;
    /// it is re-derived from the experience total.
    pub(crate) fn restore(
        coins: u64,
        experience: u64,
        crops_planted: u64,
        crops_harvested: u64,
    ) -> Self {
        Self {
            coins,
            experience,
            crops_planted,
            crops_harvested,
        }
    }

    /// Coins currently held.
    pub fn coins(&self) -> u64 {
        self.coins
    }

    /// Total accumulated experience. Never decreases.
    pub fn experience(&self) -> u64 {
        self.experience
    }

    /// Lifetime count of seeds planted.
    pub fn crops_planted(&self) -> u64 {
        self.crops_planted
    }

    /// Lifetime count of harvests, offline auto-harvests included.
    pub fn crops_harvested(&self) -> u64 {
        self.crops_harvested
    }

    /// Current level: `experience / xp_per_level + 1`.
    pub fn level(&self, xp_per_level: u64) -> u32 {
        let per = xp_per_level.max(1);
        u32::try_from(self.experience / per + 1).unwrap_or(u32::MAX)
    }

    /// Fraction of the way to the next level, in `[0, 1)`.
    pub fn xp_progress(&self, xp_per_level: u64) -> f64 {
        let per = xp_per_level.max(1);
        (self.experience % per) as f64 / per as f64
    }

    /// Experience accumulated within the current level.
    pub fn xp_into_level(&self, xp_per_level: u64) -> u64 {
        self.experience % xp_per_level.max(1)
    }

    /// Deduct coins, refusing if the balance is too low.
    pub fn spend(&mut self, amount: u64) -> Result<(), GameError> {
        if self.coins < amount {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.coins,
            });
        }
        self.coins -= amount;
        Ok(())
    }

    /// Credit coins and experience; returns the number of levels gained,
    /// which can be more than one when a single reward crosses several
    /// thresholds.
    pub fn earn(&mut self, coins: u64, xp: u64, xp_per_level: u64) -> u32 {
        let before = self.level(xp_per_level);
        self.coins = self.coins.saturating_add(coins);
        self.experience = self.experience.saturating_add(xp);
        self.level(xp_per_level) - before
    }

    pub(crate) fn record_planted(&mut self) {
        self.crops_planted += 1;
    }

    pub(crate) fn record_harvested(&mut self) {
        self.crops_harvested += 1;
    }

    /// Whether a crop type is unlocked at the current level.
    pub fn has_unlocked(&self, ty: &CropType, xp_per_level: u64) -> bool {
        ty.unlock_level <= self.level(xp_per_level)
    }

    /// Crop types plantable at the current level, recomputed on demand.
    pub fn unlocked<'a>(
        &self,
        catalog: &'a Catalog,
        xp_per_level: u64,
    ) -> impl Iterator<Item = &'a CropType> + 'a {
        let level = self.level(xp_per_level);
        catalog.iter().filter(move |ty| ty.unlock_level <= level)
    }
}
