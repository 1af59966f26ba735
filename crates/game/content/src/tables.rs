//! Built-in point-of-interest and merchant tables.
//!
//! These are fixed for the lifetime of the chain; only the obstacle grid,
//! the harvest areas and the crown spawns come from a world file.

use hunt_core::GameConfig;
use hunt_core::env::{MerchantTable, PoiTable};
use hunt_core::WorldError;

const NUM_POI: usize = GameConfig::NUM_POI;
const NUM_MERCHANTS: usize = GameConfig::NUM_MERCHANTS;

// ============================================================================
// Points of interest
// ============================================================================
// Teleporters 0..=7, centre 8, inner ring 9..=37 (crescents 26..=37), outer
// ring 38..=93 (monster homes 82..=93), team bases 94..=97.

const POI_XA: [i32; NUM_POI] = [
      8, 245, 497, 256, 493, 256,  15, 245, 250, 254, 140, 162, 223, 229, 276, 273,
    341, 362, 341, 361, 272, 277, 228, 227, 141, 160, 101, 103, 181, 405, 400, 321,
    399, 397, 320, 100, 178, 103,  74, 132,  69, 105,  11, 155, 225, 192,  12,  10,
     67, 427, 369, 432, 396, 490, 277, 348, 313, 491, 493, 432, 428, 433, 369, 490,
    396, 493, 490, 434, 278, 347, 312,  74,  68, 133,  11, 105,   9,  11,  68, 153,
    223, 189, 102, 102, 226, 276, 400, 399, 277, 224,   8, 250, 495, 250,   5, 494,
    493,   6,
];

const POI_YA: [i32; NUM_POI] = [
      6, 243,   4, 244, 494, 254, 490, 254, 250, 260, 223, 227, 136, 155, 138, 156,
    226, 224, 274, 278, 345, 365, 345, 366, 278, 275,  94, 174,  98,  92, 176,  98,
    405, 322, 401, 405, 402, 323,  67,  62, 131,  10, 106,  11,   9,  63, 150, 225,
    188,  68,  62, 130,  11, 105,   9,  10,  64, 155, 224, 188, 431, 369, 438, 393,
    489, 277, 344, 313, 492, 489, 437, 432, 369, 439, 394, 491, 279, 345, 311, 489,
    492, 437, 224, 277,  94,  94, 225, 275, 406, 406, 248,   6, 250, 496,   9,   9,
    498, 492,
];

/// Teleport exits; every other POI has none and keeps the origin.
const POI_XB: [i32; NUM_POI] = [
    246,   9, 255, 496, 255, 492, 246,  14,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,
];

const POI_YB: [i32; NUM_POI] = [
    245,   7, 245,   5, 253, 495, 253, 491,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,
];

const POI_KIND: [u8; NUM_POI] = [
      1,   5,   2,   6,   3,   7,   4,   8,  13,  14,  14,  14,  14,  14,  14,  14,
     14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,  14,
     14,  14,  14,  14,  14,  14,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,
     15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,
     15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,
     15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  15,  16,  16,
     16,  16,
];

// ============================================================================
// Merchants
// ============================================================================
// Index is the merchant role; entry 0 is unused. Roles 1..=8 are the
// teleport merchants, matching the POI kind they serve.

const MERCHANT_X: [i32; NUM_MERCHANTS] = [
      0,   7, 496, 494,  13, 246, 255, 255, 244, 208, 208, 252, 250,
      6, 255, 250, 245, 254,   3,  17,  19, 262, 275, 263, 265, 212,
    273, 273, 272, 478, 479, 230, 232, 237, 235, 251, 250, 240, 490,
];

const MERCHANT_Y: [i32; NUM_MERCHANTS] = [
      0,   8,   4, 492, 491, 242, 243, 255, 254, 264, 265, 238, 237,
     16, 251, 248, 250, 245,  15, 484, 487, 235, 246, 237, 239, 258,
    247, 249, 250,  14,  15, 243, 245, 273, 274, 244, 256, 242, 497,
];

/// Team a dead character must belong to before it can come back as this merchant.
const MERCHANT_COLOR: [u8; NUM_MERCHANTS] = [
      0,   0,   1,   2,   3,   0,   1,   2,   3,   0,   1,   2,   3,
      1,   0,   0,   0,   2,   3,   1,   3,   2,   3,   1,   1,   3,
      1,   3,   1,   3,   1,   3,   1,   0,   0,   2,   2,   3,   2,
];

const MERCHANT_CHRONON: [i32; NUM_MERCHANTS] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
];

pub fn builtin_pois() -> Result<PoiTable, WorldError> {
    PoiTable::from_arrays(&POI_XA, &POI_YA, &POI_XB, &POI_YB, &POI_KIND)
}

pub fn builtin_merchants() -> Result<MerchantTable, WorldError> {
    MerchantTable::from_arrays(&MERCHANT_X, &MERCHANT_Y, &MERCHANT_COLOR, &MERCHANT_CHRONON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_core::env::PoiKind;
    use hunt_core::{Coord, Role};

    #[test]
    fn poi_layout_matches_the_index_ranges() {
        let pois = builtin_pois().unwrap();
        for k in PoiTable::TELEPORTS {
            assert!(pois.kind(k).is_teleport(), "poi {k}");
        }
        assert_eq!(pois.kind(PoiTable::CENTER), PoiKind::CENTER);
        assert_eq!(pois.anchor(PoiTable::CENTER), Coord::new(250, 250));
        for k in PoiTable::NORMAL {
            assert!(pois.kind(k).is_harvest(), "poi {k}");
        }
        for color in 0..GameConfig::NUM_TEAM_COLORS {
            assert_eq!(pois.kind(PoiTable::BASE_FIRST + color), PoiKind::BASE);
        }
    }

    #[test]
    fn teleporters_lead_to_the_centre_and_back() {
        let pois = builtin_pois().unwrap();
        let to_centre = pois.get(0).unwrap();
        assert_eq!(to_centre.anchor, Coord::new(8, 6));
        assert_eq!(to_centre.exit, Coord::new(246, 245));
        let home = pois.get(1).unwrap();
        assert_eq!(home.exit, Coord::new(9, 7));
    }

    #[test]
    fn merchant_roles_have_homes() {
        let merchants = builtin_merchants().unwrap();
        assert_eq!(merchants.base(Role(1)), Some(Coord::new(7, 8)));
        assert_eq!(merchants.base(Role(38)), Some(Coord::new(490, 497)));
    }
}
