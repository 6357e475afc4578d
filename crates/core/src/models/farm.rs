//! The farm grid: a fixed-size field of plots, each holding at most one
//! crop.

use crate::catalog::{Catalog, CropType};
use crate::error::GameError;
use crate::models::crop::{Crop, Timestamp};

/// Fixed-size grid of plots. Owns every crop planted in it; slots go
/// empty -> occupied only through [`Farm::plant`] and occupied -> empty
/// only through [`Farm::harvest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Farm {
    width: u32,
    height: u32,
    slots: Vec<Option<Crop>>,
}

impl Farm {
    /// Create an empty farm of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            slots: vec![None; (width * height) as usize],
        }
    }

    /// Grid width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Whether the coordinate lies inside the grid.
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// The crop at a plot, if any. Out-of-bounds coordinates read as empty.
    pub fn crop_at(&self, x: u32, y: u32) -> Option<&Crop> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.slots[self.index(x, y)].as_ref()
    }

    /// Check that a plot exists and is empty.
    pub fn ensure_vacant(&self, x: u32, y: u32) -> Result<(), GameError> {
        if !self.in_bounds(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        if self.slots[self.index(x, y)].is_some() {
            return Err(GameError::SlotOccupied { x, y });
        }
        Ok(())
    }

    /// Plant a new crop of `ty` at `now` and return it.
    pub fn plant(
        &mut self,
        x: u32,
        y: u32,
        ty: &CropType,
        now: Timestamp,
    ) -> Result<&Crop, GameError> {
        self.ensure_vacant(x, y)?;
        let crop = Crop::plant(ty, now)?;
        let index = self.index(x, y);
        Ok(self.slots[index].insert(crop))
    }

    /// Put a restored crop into a slot during load.
    pub(crate) fn place(&mut self, x: u32, y: u32, crop: Crop) -> Result<(), GameError> {
        self.ensure_vacant(x, y)?;
        let index = self.index(x, y);
        self.slots[index] = Some(crop);
        Ok(())
    }

    /// Remove and return the crop at a plot. Refuses with `CropNotReady`
    /// unless the crop's growth duration has elapsed; the reconciliation
    /// engine only ever calls this for crops it already knows are ready.
    pub fn harvest(
        &mut self,
        x: u32,
        y: u32,
        catalog: &Catalog,
        now: Timestamp,
    ) -> Result<Crop, GameError> {
        if !self.in_bounds(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        let index = self.index(x, y);
        {
            let crop = self.slots[index]
                .as_ref()
                .ok_or(GameError::EmptySlot { x, y })?;
            let ty = catalog
                .get(crop.kind())
                .ok_or_else(|| GameError::UnknownCrop {
                    id: crop.kind().to_string(),
                })?;
            if !crop.is_ready(ty, now) {
                return Err(GameError::CropNotReady {
                    remaining_secs: crop.remaining_secs(ty, now).ceil() as u64,
                });
            }
        }
        self.slots[index].take().ok_or(GameError::EmptySlot { x, y })
    }

    /// All occupied plots as `((x, y), crop)` pairs, row by row.
    pub fn crops(&self) -> impl Iterator<Item = ((u32, u32), &Crop)> + '_ {
        let width = self.width;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.as_ref()
                .map(|crop| ((index as u32 % width, index as u32 / width), crop))
        })
    }

    /// Number of occupied plots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_crops;

    fn catalog() -> Catalog {
        Catalog::new(default_crops()).expect("builtin crops must validate")
    }

    #[test]
    fn plant_then_harvest_clears_the_slot() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let mut farm = Farm::new(4, 4);

        let kind = farm
            .plant(1, 2, &radish, 0.0)
            .expect("empty plot")
            .kind()
            .to_string();
        assert_eq!(kind, "radish");
        assert_eq!(farm.occupied(), 1);

        let harvested = farm.harvest(1, 2, &catalog, 30.0).expect("ready crop");
        assert_eq!(harvested.kind(), "radish");
        assert_eq!(harvested.planted_at(), 0.0);
        assert!(farm.crop_at(1, 2).is_none());
        assert_eq!(farm.occupied(), 0);
    }

    #[test]
    fn occupied_slot_refuses_planting() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let mut farm = Farm::new(4, 4);

        farm.plant(0, 0, &radish, 0.0).expect("empty plot");
        assert_eq!(
            farm.plant(0, 0, &radish, 1.0),
            Err(GameError::SlotOccupied { x: 0, y: 0 })
        );
    }

    #[test]
    fn out_of_bounds_is_refused() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let mut farm = Farm::new(4, 4);

        assert_eq!(
            farm.plant(4, 0, &radish, 0.0),
            Err(GameError::OutOfBounds { x: 4, y: 0 })
        );
        assert_eq!(
            farm.harvest(0, 7, &catalog, 0.0),
            Err(GameError::OutOfBounds { x: 0, y: 7 })
        );
        assert!(farm.crop_at(9, 9).is_none());
    }

    #[test]
    fn harvesting_an_unready_crop_is_refused() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let mut farm = Farm::new(4, 4);

        farm.plant(0, 0, &radish, 0.0).expect("empty plot");
        assert_eq!(
            farm.harvest(0, 0, &catalog, 29.0),
            Err(GameError::CropNotReady { remaining_secs: 1 })
        );
        assert!(farm.crop_at(0, 0).is_some(), "refusal must not remove");
    }

    #[test]
    fn harvesting_twice_hits_an_empty_slot() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let mut farm = Farm::new(4, 4);

        farm.plant(0, 0, &radish, 0.0).expect("empty plot");
        farm.harvest(0, 0, &catalog, 30.0).expect("ready crop");
        assert_eq!(
            farm.harvest(0, 0, &catalog, 30.0),
            Err(GameError::EmptySlot { x: 0, y: 0 })
        );
    }

    #[test]
    fn crops_iterates_occupied_plots_with_coordinates() {
        let catalog = catalog();
        let radish = catalog.get("radish").expect("builtin").clone();
        let carrot = catalog.get("carrot").expect("builtin").clone();
        let mut farm = Farm::new(3, 2);

        farm.plant(2, 0, &radish, 5.0).expect("empty plot");
        farm.plant(0, 1, &carrot, 7.0).expect("empty plot");

        let listed: Vec<_> = farm
            .crops()
            .map(|((x, y), crop)| (x, y, crop.kind().to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (2, 0, "radish".to_string()),
                (0, 1, "carrot".to_string()),
            ]
        );
    }
}
