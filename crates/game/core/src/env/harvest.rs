use super::WorldError;
use crate::config::GameConfig;
use crate::state::Coord;

/// Tiles where one share of the block treasure is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarvestArea {
    /// Share of the treasure, in cents out of [`GameConfig::TOTAL_HARVEST`].
    pub portion: i64,
    pub tiles: Vec<Coord>,
}

/// The 18 harvest areas plus the crown spawn candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestAreas {
    areas: Vec<HarvestArea>,
    crown_spawns: Vec<Coord>,
}

impl HarvestAreas {
    pub fn new(areas: Vec<HarvestArea>, crown_spawns: Vec<Coord>) -> Result<Self, WorldError> {
        if areas.len() != GameConfig::NUM_HARVEST_AREAS {
            return Err(WorldError::TableLength {
                table: "harvest area",
                expected: GameConfig::NUM_HARVEST_AREAS,
                found: areas.len(),
            });
        }
        if crown_spawns.len() != GameConfig::NUM_CROWN_LOCATIONS {
            return Err(WorldError::TableLength {
                table: "crown spawn",
                expected: GameConfig::NUM_CROWN_LOCATIONS,
                found: crown_spawns.len(),
            });
        }

        let total: i64 = areas.iter().map(|a| a.portion).sum::<i64>() + GameConfig::CROWN_BONUS;
        if total != GameConfig::TOTAL_HARVEST {
            return Err(WorldError::HarvestTotal { total });
        }
        for (index, area) in areas.iter().enumerate() {
            if area.tiles.is_empty() {
                return Err(WorldError::EmptyHarvestArea { index });
            }
            if area.tiles.iter().any(|c| !c.is_inside_map()) {
                return Err(WorldError::HarvestOutsideMap { index });
            }
        }
        if let Some(&coord) = crown_spawns.iter().find(|c| !c.is_inside_map()) {
            return Err(WorldError::CrownSpawnOutsideMap { coord });
        }

        Ok(Self {
            areas,
            crown_spawns,
        })
    }

    pub fn areas(&self) -> &[HarvestArea] {
        &self.areas
    }

    pub fn crown_spawns(&self) -> &[Coord] {
        &self.crown_spawns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(portion: i64) -> Vec<HarvestArea> {
        (0..GameConfig::NUM_HARVEST_AREAS)
            .map(|i| HarvestArea {
                portion,
                tiles: vec![Coord::new(100 + i as i32, 100)],
            })
            .collect()
    }

    #[test]
    fn portions_must_add_up_with_the_crown_bonus() {
        let crowns = vec![Coord::new(1, 1); GameConfig::NUM_CROWN_LOCATIONS];
        // 18 * 48 + 25 = 889
        assert_eq!(
            HarvestAreas::new(areas(48), crowns.clone()),
            Err(WorldError::HarvestTotal { total: 889 })
        );

        let mut fixed = areas(48);
        fixed[0].portion += 11;
        assert!(HarvestAreas::new(fixed, crowns).is_ok());
    }
}
