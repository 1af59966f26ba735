//! Static world contract errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::Coord;

/// The static tables handed to [`World::new`](super::World::new) are
/// inconsistent. Nothing can run on such a world.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("{table} table has {found} entries, expected {expected}")]
    TableLength {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("obstacle map has {found} rows, expected {expected}")]
    ObstacleRows { expected: usize, found: usize },

    #[error("obstacle row {row} has {found} columns, expected {expected}")]
    ObstacleRowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown obstacle symbol {symbol:?} at {coord}")]
    ObstacleSymbol { coord: Coord, symbol: char },

    #[error("poi {index} lies outside the map")]
    PoiOutsideMap { index: usize },

    #[error("merchant {index} has its base outside the map")]
    MerchantOutsideMap { index: usize },

    #[error("merchant {index} has invalid colour {color}")]
    MerchantColor { index: usize, color: u8 },

    /// Harvest portions plus the crown bonus must equal the total harvest.
    #[error("harvest portions add up to {total} cents")]
    HarvestTotal { total: i64 },

    #[error("harvest area {index} has no tiles")]
    EmptyHarvestArea { index: usize },

    #[error("harvest area {index} has a tile outside the map")]
    HarvestOutsideMap { index: usize },

    #[error("crown spawn {coord} lies outside the map")]
    CrownSpawnOutsideMap { coord: Coord },
}

impl GameError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use WorldError::*;
        match self {
            TableLength { .. } => "WORLD_TABLE_LENGTH",
            ObstacleRows { .. } | ObstacleRowWidth { .. } => "WORLD_OBSTACLE_SHAPE",
            ObstacleSymbol { .. } => "WORLD_OBSTACLE_SYMBOL",
            PoiOutsideMap { .. } => "WORLD_POI_OUTSIDE_MAP",
            MerchantOutsideMap { .. } => "WORLD_MERCHANT_OUTSIDE_MAP",
            MerchantColor { .. } => "WORLD_MERCHANT_COLOR",
            HarvestTotal { .. } => "WORLD_HARVEST_TOTAL",
            EmptyHarvestArea { .. } => "WORLD_HARVEST_EMPTY",
            HarvestOutsideMap { .. } => "WORLD_HARVEST_OUTSIDE_MAP",
            CrownSpawnOutsideMap { .. } => "WORLD_CROWN_OUTSIDE_MAP",
        }
    }
}
