use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedDefinition,
    DimensionMismatch,
    IndexOutOfRange,
    ImageDecodeFailure,
    ImageEncodeFailure,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed definition in {context}: {reason}")]
    MalformedDefinition { context: String, reason: String },

    #[error(
        "atlas is {width}x{height} px, not a multiple of the {tile_width}x{tile_height} tile size"
    )]
    AtlasDimensionMismatch {
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    },

    #[error("layer {layer:?} holds {found_width}x{found_height} cells, map is {width}x{height}")]
    LayerDimensionMismatch {
        layer: String,
        found_width: u32,
        found_height: u32,
        width: u32,
        height: u32,
    },

    #[error("tile index {index} out of range, catalog holds {count} tiles")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("event {id} at ({x}, {y}) lies outside the {width}x{height} map")]
    EventOutOfBounds {
        id: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("layer {layer:?} cell ({x}, {y})")]
    Cell {
        layer: String,
        x: u32,
        y: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to decode image {path:?}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode image")]
    ImageEncode(#[source] image::ImageError),

    #[error("i/o error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedDefinition { .. } => ErrorKind::MalformedDefinition,
            Error::AtlasDimensionMismatch { .. } | Error::LayerDimensionMismatch { .. } => {
                ErrorKind::DimensionMismatch
            }
            Error::IndexOutOfRange { .. } | Error::EventOutOfBounds { .. } => {
                ErrorKind::IndexOutOfRange
            }
            Error::Cell { source, .. } => source.kind(),
            Error::ImageDecode { .. } => ErrorKind::ImageDecodeFailure,
            Error::ImageEncode(_) => ErrorKind::ImageEncodeFailure,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedDefinition {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn at_cell(self, layer: &str, x: u32, y: u32) -> Self {
        Error::Cell {
            layer: layer.to_string(),
            x,
            y,
            source: Box::new(self),
        }
    }
}
