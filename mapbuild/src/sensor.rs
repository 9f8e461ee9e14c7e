//! Packs a map into the sensor blob read by the runtime for collision and
//! event lookup. The record layout lives in `mapbuild_sensor`.

use crate::map::Map;
use log::debug;
pub use mapbuild_sensor::{Record, EVENT, KNOWN_FLAGS, RECORD_SIZE, SOLID, WATER};

/// Flags for (x, y): SOLID / WATER if any layer's tile there has them, EVENT
/// if an event sits there.
pub fn flags(map: &Map, x: u32, y: u32) -> u8 {
    let mut flags = 0;
    for tile in map.stack(x, y) {
        if tile.solid {
            flags |= SOLID;
        }
        if tile.water {
            flags |= WATER;
        }
    }
    if map.events.get(x, y).is_some() {
        flags |= EVENT;
    }
    flags
}

/// One record per cell, row-major, `2 * width * height` bytes.
pub fn pack(map: &Map) -> Vec<u8> {
    let mut blob =
        Vec::with_capacity(mapbuild_sensor::blob_size(map.width as usize, map.height as usize));
    for y in 0..map.height {
        for x in 0..map.width {
            let record = Record {
                flags: flags(map, x, y),
                event: map.events.get(x, y).copied().unwrap_or(0),
            };
            debug_assert_eq!(
                record.flags & !KNOWN_FLAGS,
                0,
                "reserved bit set at ({}, {})",
                x,
                y
            );
            blob.extend_from_slice(&record.encode());
        }
    }
    debug!("packed {} sensor records", blob.len() / RECORD_SIZE);
    blob
}
