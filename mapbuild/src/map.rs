use crate::definition::{LayerDefinition, MapDefinition, ObjectDefinition};
use crate::error::{Error, Result};
use crate::grid::CellGrid;
use crate::tile::{Tile, TileCatalog};
use log::{debug, warn};

/// Raw layer index meaning "no tile". Positive indices are 1-based.
pub const EMPTY_INDEX: u32 = 0;

pub struct Layer<'a> {
    pub name: String,
    pub cells: CellGrid<&'a Tile>,
}

/// A loaded map: render layers bottom to top plus the event grid.
pub struct Map<'a> {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer<'a>>,
    pub events: CellGrid<u8>,
    pub catalog: &'a TileCatalog,
}

impl<'a> Map<'a> {
    pub fn load(definition: &MapDefinition, catalog: &'a TileCatalog) -> Result<Self> {
        let width = definition.width;
        let height = definition.height;

        if (definition.tile_width, definition.tile_height)
            != (catalog.tile_width, catalog.tile_height)
        {
            warn!(
                "map tile size {}x{} differs from tileset tile size {}x{}, using the tileset's",
                definition.tile_width,
                definition.tile_height,
                catalog.tile_width,
                catalog.tile_height
            );
        }
        match definition.tilesets.as_slice() {
            [] | [_] => {}
            more => warn!(
                "map references {} tilesets, indices resolve against the first only",
                more.len()
            ),
        }
        if let Some(first) = definition.tilesets.first() {
            if first.first_gid != 1 {
                warn!(
                    "tileset firstgid is {}, indices are still read as 1-based",
                    first.first_gid
                );
            }
        }

        let mut layers = Vec::with_capacity(definition.layers.len());
        for layer in &definition.layers {
            if (layer.width, layer.height) != (width, height) {
                return Err(Error::LayerDimensionMismatch {
                    layer: layer.name.clone(),
                    found_width: layer.width,
                    found_height: layer.height,
                    width,
                    height,
                });
            }
            let cells = load_layer(layer, catalog)?;
            debug!(
                "layer {:?}: {} of {} cells occupied",
                layer.name,
                cells.occupied(),
                width * height
            );
            layers.push(Layer {
                name: layer.name.clone(),
                cells,
            });
        }

        let mut events = CellGrid::new(width, height);
        for object in &definition.objects {
            place_event(&mut events, object, catalog)?;
        }
        debug!("{} events placed", events.occupied());

        Ok(Map {
            width,
            height,
            layers,
            events,
            catalog,
        })
    }

    pub fn tile_width(&self) -> u32 {
        self.catalog.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.catalog.tile_height
    }

    /// Tiles occupying (x, y), bottom layer first.
    pub fn stack(&self, x: u32, y: u32) -> impl Iterator<Item = &'a Tile> + '_ {
        self.layers
            .iter()
            .filter_map(move |layer| layer.cells.get(x, y).copied())
    }
}

fn load_layer<'a>(layer: &LayerDefinition, catalog: &'a TileCatalog) -> Result<CellGrid<&'a Tile>> {
    let mut cells = CellGrid::new(layer.width, layer.height);
    let rows: Vec<&str> = layer.data.split_whitespace().collect();
    if rows.len() > layer.height as usize {
        return Err(Error::LayerDimensionMismatch {
            layer: layer.name.clone(),
            found_width: layer.width,
            found_height: rows.len() as u32,
            width: layer.width,
            height: layer.height,
        });
    }

    for (y, row) in rows.iter().enumerate() {
        let y = y as u32;
        let mut fields: Vec<&str> = row.split(',').collect();
        // Tiled ends every row but the last with a separator
        if fields.last().map_or(false, |f| f.trim().is_empty()) {
            fields.pop();
        }
        if fields.len() > layer.width as usize {
            return Err(Error::LayerDimensionMismatch {
                layer: layer.name.clone(),
                found_width: fields.len() as u32,
                found_height: layer.height,
                width: layer.width,
                height: layer.height,
            });
        }
        for (x, field) in fields.iter().enumerate() {
            let x = x as u32;
            let tile = resolve(field, catalog).map_err(|e| e.at_cell(&layer.name, x, y))?;
            cells.set(x, y, tile);
        }
    }
    Ok(cells)
}

/// Resolves one raw CSV field. Blank and `0` are empty.
fn resolve<'a>(field: &str, catalog: &'a TileCatalog) -> Result<Option<&'a Tile>> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    let index: u32 = field
        .parse()
        .map_err(|_| Error::malformed("layer data", format!("invalid tile index {:?}", field)))?;
    if index == EMPTY_INDEX {
        return Ok(None);
    }
    catalog.get(index as usize - 1).map(Some)
}

fn place_event(
    events: &mut CellGrid<u8>,
    object: &ObjectDefinition,
    catalog: &TileCatalog,
) -> Result<()> {
    let context = || format!("object {}", object.id);
    for value in [object.x, object.y] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::malformed(
                context(),
                format!("invalid position ({}, {})", object.x, object.y),
            ));
        }
    }
    let x = object.x.floor() as u32 / catalog.tile_width;
    let y = object.y.floor() as u32 / catalog.tile_height;
    if x >= events.width() || y >= events.height() {
        return Err(Error::EventOutOfBounds {
            id: object.id,
            x,
            y,
            width: events.width(),
            height: events.height(),
        });
    }
    let id = u8::try_from(object.id)
        .map_err(|_| Error::malformed(context(), "event id does not fit in one byte"))?;
    if let Some(previous) = events.get(x, y) {
        debug!("event {} replaces event {} at ({}, {})", id, previous, x, y);
    }
    events.set(x, y, Some(id));
    Ok(())
}
