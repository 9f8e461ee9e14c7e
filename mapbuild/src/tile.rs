use crate::definition::TilesetDefinition;
use crate::error::{Error, Result};
use image::io::Reader as ImageReader;
use image::{imageops, RgbaImage};
use log::debug;
use std::path::Path;

/// Boolean tile properties understood by the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileAttributes {
    /// Rendered above the player, into the overlay image.
    pub overlay: bool,
    pub solid: bool,
    pub water: bool,
}

impl TileAttributes {
    /// Applies one named property. Only the exact value `true` is truthy;
    /// unknown names are ignored.
    pub fn set_property(&mut self, name: &str, value: &str) {
        let value = value == "true";
        match name {
            "overlay" => self.overlay = value,
            "solid" => self.solid = value,
            "water" => self.water = value,
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub image: RgbaImage,
    pub overlay: bool,
    pub solid: bool,
    pub water: bool,
}

impl Tile {
    pub fn new(image: RgbaImage, attributes: TileAttributes) -> Self {
        Tile {
            image,
            overlay: attributes.overlay,
            solid: attributes.solid,
            water: attributes.water,
        }
    }

    pub fn attributes(&self) -> TileAttributes {
        TileAttributes {
            overlay: self.overlay,
            solid: self.solid,
            water: self.water,
        }
    }
}

/// Tiles of one atlas, indexed by source tile id.
#[derive(Debug)]
pub struct TileCatalog {
    tiles: Vec<Tile>,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileCatalog {
    /// Decodes the definition's atlas image and slices it.
    pub fn open(definition: &TilesetDefinition) -> Result<Self> {
        let image = decode(&definition.image)?;
        Self::load(definition, image)
    }

    /// Slices `image` row-major into tiles; fragment `i` becomes tile `i` and
    /// takes the attributes declared for id `i`.
    pub fn load(definition: &TilesetDefinition, image: RgbaImage) -> Result<Self> {
        let tile_width = definition.tile_width;
        let tile_height = definition.tile_height;
        let mut tiles: Vec<Tile> = fragments(&image, tile_width, tile_height)?
            .map(|fragment| Tile::new(fragment, TileAttributes::default()))
            .collect();

        for declared in &definition.tiles {
            let count = tiles.len();
            let tile = tiles
                .get_mut(declared.id as usize)
                .ok_or(Error::IndexOutOfRange {
                    index: declared.id as usize,
                    count,
                })?;
            tile.overlay = declared.attributes.overlay;
            tile.solid = declared.attributes.solid;
            tile.water = declared.attributes.water;
        }

        debug!(
            "sliced {} {}x{} tiles from {:?} ({} with properties)",
            tiles.len(),
            tile_width,
            tile_height,
            definition.name,
            definition.tiles.len()
        );
        Ok(TileCatalog {
            tiles,
            tile_width,
            tile_height,
        })
    }

    pub fn get(&self, index: usize) -> Result<&Tile> {
        self.tiles.get(index).ok_or(Error::IndexOutOfRange {
            index,
            count: self.tiles.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

/// Splits `image` into `width` x `height` fragments, row-major. Calling it
/// again on the same image yields the same sequence.
pub fn fragments(
    image: &RgbaImage,
    width: u32,
    height: u32,
) -> Result<impl Iterator<Item = RgbaImage> + '_> {
    if width == 0 || height == 0 {
        return Err(Error::malformed(
            "tileset",
            format!("tile size {}x{} must be non-zero", width, height),
        ));
    }
    if image.width() % width != 0 || image.height() % height != 0 {
        return Err(Error::AtlasDimensionMismatch {
            width: image.width(),
            height: image.height(),
            tile_width: width,
            tile_height: height,
        });
    }
    let columns = image.width() / width;
    let rows = image.height() / height;
    Ok((0..rows).flat_map(move |y| {
        (0..columns)
            .map(move |x| imageops::crop_imm(image, x * width, y * height, width, height).to_image())
    }))
}

pub(crate) fn decode(path: &Path) -> Result<RgbaImage> {
    let decode_error = |source| Error::ImageDecode {
        path: path.to_path_buf(),
        source,
    };
    let image = ImageReader::open(path)
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?
        .into_rgba8();
    Ok(image)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::definition::TileDefinition;
    use crate::error::ErrorKind;
    use image::Rgba;
    use std::path::PathBuf;

    /// Atlas whose every pixel encodes the tile it belongs to: red = column,
    /// green = row, blue = 255, alpha = 255.
    pub(crate) fn atlas(columns: u32, rows: u32, tile_width: u32, tile_height: u32) -> RgbaImage {
        RgbaImage::from_fn(columns * tile_width, rows * tile_height, |x, y| {
            Rgba([(x / tile_width) as u8, (y / tile_height) as u8, 255, 255])
        })
    }

    pub(crate) fn tileset(
        tile_width: u32,
        tile_height: u32,
        tiles: &[(u32, TileAttributes)],
    ) -> TilesetDefinition {
        TilesetDefinition {
            name: "test".to_string(),
            tile_width,
            tile_height,
            image: PathBuf::from("test.png"),
            tiles: tiles
                .iter()
                .map(|&(id, attributes)| TileDefinition { id, attributes })
                .collect(),
        }
    }

    #[test]
    fn test_set_property() {
        let mut attributes = TileAttributes::default();
        attributes.set_property("solid", "true");
        attributes.set_property("water", "yes");
        attributes.set_property("overlay", "TRUE");
        attributes.set_property("slippery", "true");
        assert_eq!(
            attributes,
            TileAttributes {
                overlay: false,
                solid: true,
                water: false,
            }
        );

        attributes.set_property("solid", "false");
        assert!(!attributes.solid);
    }

    #[test]
    fn test_fragments_row_major() {
        let image = atlas(3, 2, 4, 2);
        let tiles: Vec<RgbaImage> = fragments(&image, 4, 2).unwrap().collect();
        assert_eq!(tiles.len(), 6);
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.dimensions(), (4, 2));
            let expected = Rgba([(i % 3) as u8, (i / 3) as u8, 255, 255]);
            assert!(tile.pixels().all(|p| *p == expected), "tile {}", i);
        }
    }

    #[test]
    fn test_fragments_restartable() {
        let image = atlas(2, 2, 2, 2);
        let first: Vec<RgbaImage> = fragments(&image, 2, 2).unwrap().collect();
        let second: Vec<RgbaImage> = fragments(&image, 2, 2).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fragments_dimension_mismatch() {
        let image = RgbaImage::new(33, 32);
        let err = fragments(&image, 16, 16).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);

        let image = RgbaImage::new(32, 20);
        let err = fragments(&image, 16, 16).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_fragments_zero_size() {
        let image = RgbaImage::new(32, 32);
        let err = fragments(&image, 0, 16).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MalformedDefinition);
    }

    #[test]
    fn test_catalog_get_matches_atlas_position() {
        let definition = tileset(8, 8, &[]);
        let catalog = TileCatalog::load(&definition, atlas(4, 3, 8, 8)).unwrap();
        assert_eq!(catalog.len(), 12);
        for i in 0..catalog.len() {
            let tile = catalog.get(i).unwrap();
            let expected = Rgba([(i % 4) as u8, (i / 4) as u8, 255, 255]);
            assert_eq!(*tile.image.get_pixel(0, 0), expected);
            assert_eq!(*tile.image.get_pixel(7, 7), expected);
        }
    }

    #[test]
    fn test_catalog_attributes_by_id() {
        let solid = TileAttributes {
            solid: true,
            ..Default::default()
        };
        let overlay_water = TileAttributes {
            overlay: true,
            water: true,
            ..Default::default()
        };
        let definition = tileset(8, 8, &[(0, solid), (3, overlay_water)]);
        let catalog = TileCatalog::load(&definition, atlas(2, 2, 8, 8)).unwrap();

        assert_eq!(catalog.get(0).unwrap().attributes(), solid);
        assert_eq!(catalog.get(1).unwrap().attributes(), TileAttributes::default());
        assert_eq!(catalog.get(2).unwrap().attributes(), TileAttributes::default());
        assert_eq!(catalog.get(3).unwrap().attributes(), overlay_water);
    }

    #[test]
    fn test_catalog_missing_water_defaults_false() {
        let mut attributes = TileAttributes::default();
        attributes.set_property("solid", "true");
        attributes.set_property("overlay", "false");
        let definition = tileset(8, 8, &[(0, attributes)]);
        let catalog = TileCatalog::load(&definition, atlas(1, 1, 8, 8)).unwrap();
        assert!(!catalog.get(0).unwrap().water);
    }

    #[test]
    fn test_catalog_get_out_of_range() {
        let definition = tileset(8, 8, &[]);
        let catalog = TileCatalog::load(&definition, atlas(2, 1, 8, 8)).unwrap();
        let err = catalog.get(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert!(matches!(err, Error::IndexOutOfRange { index: 2, count: 2 }));
    }

    #[test]
    fn test_catalog_declared_id_beyond_atlas() {
        let definition = tileset(8, 8, &[(5, TileAttributes::default())]);
        let err = TileCatalog::load(&definition, atlas(2, 1, 8, 8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_catalog_atlas_not_multiple() {
        let definition = tileset(16, 16, &[]);
        let err = TileCatalog::load(&definition, RgbaImage::new(40, 32)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_open_missing_image() {
        let definition = tileset(8, 8, &[]);
        let err = TileCatalog::open(&definition).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImageDecodeFailure);
    }
}
