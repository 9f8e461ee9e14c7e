//! Compiles Tiled tilesets and CSV-encoded maps into a background image, an
//! optional overlay image and a packed per-cell sensor blob.
//!
//! The pipeline runs strictly in order: [`TileCatalog`] from a
//! [`TilesetDefinition`], [`Map`] from a [`MapDefinition`] and the catalog,
//! then [`compositor::render`] and [`sensor::pack`] over the finished map.
//! [`Artifacts`] buffers every output so nothing reaches the disk unless the
//! whole map compiled.

pub mod artifacts;
pub mod compositor;
pub mod definition;
pub mod error;
pub mod grid;
pub mod map;
pub mod sensor;
pub mod tile;

pub use artifacts::{compile, Artifacts, OutputPaths};
pub use compositor::{render, Rendered};
pub use definition::{MapDefinition, TilesetDefinition};
pub use error::{Error, ErrorKind, Result};
pub use grid::CellGrid;
pub use map::Map;
pub use tile::{Tile, TileAttributes, TileCatalog};
