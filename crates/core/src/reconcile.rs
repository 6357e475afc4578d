//! Offline reconciliation: the one-time-per-load pass that resolves the
//! elapsed real-world window against every plot.
//!
//! The pass only ever decides harvest-or-not. Growth is always computed
//! live from `planted_at`, so a still-growing crop is left exactly as it
//! was; there is no fast-forwarding of partial progress.

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Balance;
use crate::models::crop::Timestamp;
use crate::models::farm::Farm;
use crate::models::player::Player;

/// One crop force-harvested during the offline window.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoHarvest {
    /// Display name of the harvested crop.
    pub crop: String,
    /// Coins credited at the reduced offline rate.
    pub coins: u64,
    /// Experience credited in full.
    pub xp: u64,
}

/// Summary handed to the caller for display. Never blocks play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Offline window in seconds, capped at the configured maximum.
    /// Zero when the clock-rollback guard fired.
    pub offline_secs: f64,
    /// Every auto-harvest performed, in plot order.
    pub harvested: Vec<AutoHarvest>,
    /// Total coins credited.
    pub coins_credited: u64,
    /// Total experience credited.
    pub xp_credited: u64,
    /// Levels gained from the credited experience.
    pub levels_gained: u32,
}

impl ReconcileReport {
    /// Whether the summary is worth interrupting the player for.
    pub fn is_noteworthy(&self, min_offline_secs: f64) -> bool {
        !self.harvested.is_empty() || self.offline_secs >= min_offline_secs
    }
}

/// Replay the window between `last_save` and `now` against every plot.
///
/// Deterministic and idempotent: crops that became ready during the window
/// are force-harvested at `offline_multiplier` of their sell price (floored,
/// for a conservative economy) plus their full experience reward; a second
/// run with no time elapsed finds `elapsed <= 0` and touches nothing.
pub fn reconcile(
    farm: &mut Farm,
    player: &mut Player,
    catalog: &Catalog,
    balance: &Balance,
    last_save: Timestamp,
    now: Timestamp,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let elapsed = now - last_save;
    if elapsed <= 0.0 {
        if elapsed < 0.0 {
            warn!(
                last_save,
                now, "save timestamp is ahead of the clock; leaving every plot untouched"
            );
        }
        return report;
    }
    report.offline_secs = elapsed.min(balance.max_offline_secs);

    let ready: Vec<(u32, u32)> = farm
        .crops()
        .filter_map(|((x, y), crop)| match catalog.get(crop.kind()) {
            Some(ty) if crop.is_ready(ty, now) => Some((x, y)),
            Some(_) => None,
            None => {
                warn!(
                    kind = crop.kind(),
                    x, y, "crop type missing from catalog; leaving it in place"
                );
                None
            }
        })
        .collect();

    for (x, y) in ready {
        let crop = match farm.harvest(x, y, catalog, now) {
            Ok(crop) => crop,
            Err(err) => {
                warn!(%err, x, y, "offline harvest refused");
                continue;
            }
        };
        let Some(ty) = catalog.get(crop.kind()) else {
            continue;
        };
        let coins = (ty.sell_price as f64 * balance.offline_multiplier).floor() as u64;
        report.levels_gained += player.earn(coins, ty.xp_reward, balance.xp_per_level);
        player.record_harvested();
        report.coins_credited += coins;
        report.xp_credited += ty.xp_reward;
        report.harvested.push(AutoHarvest {
            crop: ty.name.clone(),
            coins,
            xp: ty.xp_reward,
        });
    }

    if !report.harvested.is_empty() {
        info!(
            count = report.harvested.len(),
            coins = report.coins_credited,
            xp = report.xp_credited,
            "auto-harvested crops that ripened while away"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_crops;

    fn setup() -> (Farm, Player, Catalog, Balance) {
        let catalog = Catalog::new(default_crops()).expect("builtin crops must validate");
        (Farm::new(4, 4), Player::new(100), catalog, Balance::default())
    }

    fn plant(farm: &mut Farm, catalog: &Catalog, id: &str, x: u32, y: u32, at: f64) {
        let ty = catalog.get(id).expect("crop id must exist").clone();
        farm.plant(x, y, &ty, at).expect("plot must be free");
    }

    #[test]
    fn still_growing_crops_are_left_untouched() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, 10.0);

        assert!(report.harvested.is_empty());
        assert_eq!(report.offline_secs, 10.0);
        assert_eq!(player.coins(), 100);
        let crop = farm.crop_at(0, 0).expect("crop stays planted");
        assert_eq!(crop.planted_at(), 0.0, "growth clock must not be advanced");
    }

    #[test]
    fn ripened_crop_is_auto_harvested_at_the_reduced_rate() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, 100.0);

        // floor(15 * 0.7) = 10 coins, full 10 xp.
        assert_eq!(
            report.harvested,
            vec![AutoHarvest {
                crop: "Radish".to_string(),
                coins: 10,
                xp: 10
            }]
        );
        assert_eq!(report.coins_credited, 10);
        assert_eq!(report.xp_credited, 10);
        assert_eq!(player.coins(), 110);
        assert_eq!(player.experience(), 10);
        assert_eq!(player.crops_harvested(), 1);
        assert!(farm.crop_at(0, 0).is_none());
    }

    #[test]
    fn credit_beyond_the_cap_stays_flat() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        let far_future = 30.0 + 1_000_000.0;
        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, far_future);

        assert_eq!(report.offline_secs, balance.max_offline_secs);
        assert_eq!(report.coins_credited, 10, "credit never scales with excess time");
        assert_eq!(report.xp_credited, 10);
    }

    #[test]
    fn second_run_with_no_time_elapsed_is_a_noop() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);
        plant(&mut farm, &catalog, "carrot", 1, 0, 0.0);

        let first = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, 100.0);
        assert_eq!(first.harvested.len(), 2);
        let coins_after_first = player.coins();

        let second = reconcile(&mut farm, &mut player, &catalog, &balance, 100.0, 100.0);
        assert_eq!(second, ReconcileReport::default());
        assert_eq!(player.coins(), coins_after_first, "no duplicate credit");
    }

    #[test]
    fn clock_rollback_touches_nothing() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 1000.0, 500.0);

        assert_eq!(report, ReconcileReport::default());
        assert!(farm.crop_at(0, 0).is_some());
        assert_eq!(player.coins(), 100);
    }

    #[test]
    fn crop_already_ready_at_save_time_is_still_credited() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        // Saved at t=50, well after the radish ripened at t=30.
        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 50.0, 60.0);

        assert_eq!(report.harvested.len(), 1);
        assert_eq!(player.coins(), 110);
        assert!(farm.crop_at(0, 0).is_none());
    }

    #[test]
    fn mixed_plots_only_ready_ones_are_taken() {
        let (mut farm, mut player, catalog, balance) = setup();
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0); // ready at 30
        plant(&mut farm, &catalog, "pumpkin", 1, 1, 0.0); // ready at 600

        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, 100.0);

        assert_eq!(report.harvested.len(), 1);
        assert_eq!(report.harvested[0].crop, "Radish");
        assert!(farm.crop_at(0, 0).is_none());
        assert!(farm.crop_at(1, 1).is_some());
    }

    #[test]
    fn offline_experience_can_level_up() {
        let (mut farm, mut player, catalog, mut balance) = setup();
        balance.xp_per_level = 10;
        plant(&mut farm, &catalog, "radish", 0, 0, 0.0);

        let report = reconcile(&mut farm, &mut player, &catalog, &balance, 0.0, 100.0);

        assert_eq!(report.levels_gained, 1);
        assert_eq!(player.level(balance.xp_per_level), 2);
    }

    #[test]
    fn summary_noteworthiness() {
        let mut report = ReconcileReport::default();
        assert!(!report.is_noteworthy(10.0));

        report.offline_secs = 30.0;
        assert!(report.is_noteworthy(10.0));

        report.offline_secs = 3.0;
        report.harvested.push(AutoHarvest {
            crop: "Radish".to_string(),
            coins: 10,
            xp: 10,
        });
        assert!(report.is_noteworthy(10.0));
    }
}
