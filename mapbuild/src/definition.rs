//! Tiled `.tsx` / `.tmx` readers.
//!
//! Only the parts of the format the compiler consumes are kept: tile size,
//! atlas image and per-tile properties for tilesets; size, tileset
//! references, raw CSV layer text and point objects for maps. Layer text
//! stays raw; [`crate::Map::load`] owns the index rules.

use crate::error::{Error, Result};
use crate::tile::TileAttributes;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetDefinition {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Atlas image, resolved against the tileset file's directory.
    pub image: PathBuf,
    pub tiles: Vec<TileDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDefinition {
    pub id: u32,
    pub attributes: TileAttributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDefinition {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<TilesetReference>,
    pub layers: Vec<LayerDefinition>,
    pub objects: Vec<ObjectDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetReference {
    pub first_gid: u32,
    /// External `.tsx`, resolved against the map file's directory.
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDefinition {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Raw CSV text: rows separated by whitespace, fields by commas.
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDefinition {
    pub id: u32,
    /// Pixel position.
    pub x: f64,
    pub y: f64,
}

impl TilesetDefinition {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&xml, path.parent().unwrap_or_else(|| Path::new("")))
    }

    pub fn parse(xml: &str, base_dir: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut header: Option<(String, u32, u32)> = None;
        let mut image = None;
        let mut tiles = Vec::new();
        let mut current: Option<TileDefinition> = None;

        loop {
            let (e, empty) = match reader.read_event() {
                Ok(Event::Start(e)) => (e, false),
                Ok(Event::Empty(e)) => (e, true),
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"tile" {
                        if let Some(tile) = current.take() {
                            tiles.push(tile);
                        }
                    }
                    continue;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::malformed("tileset", e.to_string())),
                _ => continue,
            };
            let attrs = parse_attributes(&e, "tileset")?;
            match e.name().as_ref() {
                b"tileset" => {
                    let name = attrs.get("name").cloned().unwrap_or_default();
                    let tile_width = required(&attrs, "tilewidth", "<tileset>")?;
                    let tile_height = required(&attrs, "tileheight", "<tileset>")?;
                    header = Some((name, tile_width, tile_height));
                }
                b"image" => {
                    if current.is_some() {
                        return Err(Error::malformed(
                            "tileset",
                            "image collection tilesets are not supported",
                        ));
                    }
                    let source = attrs
                        .get("source")
                        .ok_or_else(|| Error::malformed("<image>", "missing attribute 'source'"))?;
                    image = Some(base_dir.join(source));
                }
                b"tile" => {
                    let id = match attrs.get("id") {
                        Some(_) => required(&attrs, "id", "<tile>")?,
                        None => tiles.len() as u32,
                    };
                    let tile = TileDefinition {
                        id,
                        attributes: TileAttributes::default(),
                    };
                    if empty {
                        tiles.push(tile);
                    } else {
                        current = Some(tile);
                    }
                }
                b"property" => {
                    if let (Some(tile), Some(name)) = (current.as_mut(), attrs.get("name")) {
                        let value = attrs.get("value").map(String::as_str).unwrap_or("");
                        tile.attributes.set_property(name, value);
                    }
                }
                _ => {}
            }
        }

        let (name, tile_width, tile_height) =
            header.ok_or_else(|| Error::malformed("tileset", "missing <tileset> element"))?;
        let image = image.ok_or_else(|| Error::malformed("tileset", "missing <image> element"))?;
        Ok(TilesetDefinition {
            name,
            tile_width,
            tile_height,
            image,
            tiles,
        })
    }
}

impl MapDefinition {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&xml, path.parent().unwrap_or_else(|| Path::new("")))
    }

    pub fn parse(xml: &str, base_dir: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut header: Option<(u32, u32, u32, u32)> = None;
        let mut tilesets = Vec::new();
        let mut layers = Vec::new();
        let mut objects = Vec::new();
        let mut layer: Option<LayerDefinition> = None;
        let mut in_data = false;
        // objects nested in an embedded tileset are collision shapes, not events
        let mut tileset_depth = 0usize;

        loop {
            let (e, empty) = match reader.read_event() {
                Ok(Event::Start(e)) => (e, false),
                Ok(Event::Empty(e)) => (e, true),
                Ok(Event::End(e)) => {
                    match e.name().as_ref() {
                        b"layer" => layers.extend(layer.take()),
                        b"data" => in_data = false,
                        b"tileset" => tileset_depth = tileset_depth.saturating_sub(1),
                        _ => {}
                    }
                    continue;
                }
                Ok(Event::Text(e)) => {
                    if let (true, Some(layer)) = (in_data, layer.as_mut()) {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::malformed("<data>", err.to_string()))?;
                        layer.data.push_str(&text);
                    }
                    continue;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::malformed("map", e.to_string())),
                _ => continue,
            };
            let attrs = parse_attributes(&e, "map")?;
            match e.name().as_ref() {
                b"map" => {
                    if attrs.get("infinite").map(String::as_str) == Some("1") {
                        return Err(Error::malformed("<map>", "infinite maps are not supported"));
                    }
                    header = Some((
                        required(&attrs, "width", "<map>")?,
                        required(&attrs, "height", "<map>")?,
                        required(&attrs, "tilewidth", "<map>")?,
                        required(&attrs, "tileheight", "<map>")?,
                    ));
                }
                b"tileset" => {
                    if tileset_depth == 0 {
                        tilesets.push(TilesetReference {
                            first_gid: required(&attrs, "firstgid", "<tileset>")?,
                            source: attrs.get("source").map(|s| base_dir.join(s)),
                        });
                    }
                    if !empty {
                        tileset_depth += 1;
                    }
                }
                b"layer" => {
                    let name = attrs.get("name").cloned().unwrap_or_default();
                    let context = format!("layer {:?}", name);
                    let definition = LayerDefinition {
                        width: required(&attrs, "width", &context)?,
                        height: required(&attrs, "height", &context)?,
                        name,
                        data: String::new(),
                    };
                    if empty {
                        layers.push(definition);
                    } else {
                        layer = Some(definition);
                    }
                }
                b"data" => {
                    if let Some(layer) = &layer {
                        let context = format!("layer {:?}", layer.name);
                        match attrs.get("encoding").map(String::as_str) {
                            Some("csv") => {}
                            Some(other) => {
                                return Err(Error::malformed(
                                    context,
                                    format!("unsupported encoding {:?}, expected csv", other),
                                ))
                            }
                            None => {
                                return Err(Error::malformed(
                                    context,
                                    "missing encoding, expected csv",
                                ))
                            }
                        }
                        if let Some(compression) = attrs.get("compression") {
                            return Err(Error::malformed(
                                context,
                                format!("unsupported compression {:?}", compression),
                            ));
                        }
                        in_data = !empty;
                    }
                }
                b"object" if tileset_depth == 0 => {
                    objects.push(ObjectDefinition {
                        id: required(&attrs, "id", "<object>")?,
                        x: required(&attrs, "x", "<object>")?,
                        y: required(&attrs, "y", "<object>")?,
                    });
                }
                _ => {}
            }
        }

        let (width, height, tile_width, tile_height) =
            header.ok_or_else(|| Error::malformed("map", "missing <map> element"))?;
        debug!(
            "map {}x{}: {} layers, {} objects",
            width,
            height,
            layers.len(),
            objects.len()
        );
        Ok(MapDefinition {
            width,
            height,
            tile_width,
            tile_height,
            tilesets,
            layers,
            objects,
        })
    }
}

fn parse_attributes(elem: &BytesStart, context: &str) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| Error::malformed(context, e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::malformed(context, format!("invalid UTF-8 in attribute key: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::malformed(context, e.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn required<T: std::str::FromStr>(
    attrs: &HashMap<String, String>,
    name: &str,
    context: &str,
) -> Result<T> {
    let value = attrs
        .get(name)
        .ok_or_else(|| Error::malformed(context, format!("missing attribute '{}'", name)))?;
    value.trim().parse().map_err(|_| {
        Error::malformed(context, format!("invalid value {:?} for attribute '{}'", value, name))
    })
}
