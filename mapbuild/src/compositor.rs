use crate::map::Map;
use image::{imageops, RgbaImage};
use log::debug;

pub struct Rendered {
    pub background: RgbaImage,
    /// Present only if at least one overlay tile was painted.
    pub foreground: Option<RgbaImage>,
}

/// Paints every layer, bottom first, onto two transparent canvases. Overlay
/// tiles land on the foreground, everything else on the background.
pub fn render(map: &Map) -> Rendered {
    let tile_width = map.tile_width();
    let tile_height = map.tile_height();
    let width = map.width * tile_width;
    let height = map.height * tile_height;
    let mut background = RgbaImage::new(width, height);
    let mut foreground = RgbaImage::new(width, height);

    let mut painted = 0usize;
    let mut any_overlay = false;
    for layer in &map.layers {
        for (x, y, tile) in layer.cells.iter() {
            let Some(tile) = tile else { continue };
            let canvas = if tile.overlay {
                any_overlay = true;
                &mut foreground
            } else {
                &mut background
            };
            imageops::overlay(
                canvas,
                &tile.image,
                (x * tile_width) as i64,
                (y * tile_height) as i64,
            );
            painted += 1;
        }
    }
    debug!(
        "painted {} tiles onto {}x{} canvases, overlay: {}",
        painted, width, height, any_overlay
    );

    Rendered {
        background,
        foreground: any_overlay.then_some(foreground),
    }
}
