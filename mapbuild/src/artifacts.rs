use crate::compositor::render;
use crate::definition::{MapDefinition, TilesetDefinition};
use crate::error::{Error, Result};
use crate::map::Map;
use crate::sensor::pack;
use crate::tile::TileCatalog;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Every output of one map, fully encoded and held in memory.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub background: Vec<u8>,
    pub overlay: Option<Vec<u8>>,
    pub sensor: Vec<u8>,
}

/// Where [`Artifacts::commit`] puts each output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub overlay: PathBuf,
    pub sensor: PathBuf,
}

impl OutputPaths {
    /// `maps/town.png` gives `maps/town-overlay.png` and `maps/town.dat`.
    pub fn from_image(image: impl Into<PathBuf>) -> Self {
        let image = image.into();
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let overlay_name = match image.extension() {
            Some(ext) => format!("{}-overlay.{}", stem, ext.to_string_lossy()),
            None => format!("{}-overlay", stem),
        };
        OutputPaths {
            overlay: image.with_file_name(overlay_name),
            sensor: image.with_extension("dat"),
            image,
        }
    }

    /// Outputs next to the map, named after it.
    pub fn for_map(map: &Path) -> Self {
        Self::from_image(map.with_extension("png"))
    }
}

impl Artifacts {
    pub fn build(map: &Map) -> Result<Self> {
        let rendered = render(map);
        let sensor = pack(map);
        let background = encode_png(&rendered.background)?;
        let overlay = rendered.foreground.as_ref().map(encode_png).transpose()?;
        Ok(Artifacts {
            background,
            overlay,
            sensor,
        })
    }

    /// Writes every output or none. Each file is staged next to its target
    /// and only renamed into place once all of them were written. Files
    /// being replaced are set aside as `<name>.bak` and restored if any
    /// rename fails. An overlay left from an earlier build is removed when
    /// this build has none.
    pub fn commit(&self, paths: &OutputPaths) -> Result<()> {
        let outputs = [
            (Some(&self.background), &paths.image),
            (self.overlay.as_ref(), &paths.overlay),
            (Some(&self.sensor), &paths.sensor),
        ];

        let mut staged: Vec<(PathBuf, &Path)> = Vec::new();
        for (bytes, path) in outputs {
            let Some(bytes) = bytes else { continue };
            match stage(bytes, path) {
                Ok(tmp) => staged.push((tmp, path.as_path())),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        let stale = self.overlay.is_none().then_some(paths.overlay.as_path());
        let mut replaced = Vec::new();
        if let Err(e) = swap_in(&staged, stale, &mut replaced) {
            rollback(&replaced);
            discard(&staged);
            return Err(e);
        }

        for entry in &replaced {
            if let Some(backup) = &entry.backup {
                if let Err(e) = fs::remove_file(backup) {
                    warn!("could not remove {}: {}", backup.display(), e);
                }
            }
            if entry.written {
                info!("wrote {}", entry.path.display());
            } else {
                info!("removed {} left over from an earlier build", entry.path.display());
            }
        }
        Ok(())
    }
}

/// Runs the whole pipeline for one tileset and map.
pub fn compile(tileset: &Path, map: &Path) -> Result<Artifacts> {
    let tileset = TilesetDefinition::open(tileset)?;
    let catalog = TileCatalog::open(&tileset)?;
    let definition = MapDefinition::open(map)?;
    let map = Map::load(&definition, &catalog)?;
    Artifacts::build(&map)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
        .map_err(Error::ImageEncode)?;
    Ok(png)
}

/// A target touched by [`Artifacts::commit`].
struct Replaced<'a> {
    path: &'a Path,
    /// Where the previous file was moved to, if there was one.
    backup: Option<PathBuf>,
    written: bool,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn stage(bytes: &[u8], path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let tmp = sibling(path, ".part");
    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
    debug!("staged {} bytes at {}", bytes.len(), tmp.display());
    Ok(tmp)
}

/// Moves an existing regular file out of the way.
fn set_aside(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup = sibling(path, ".bak");
    fs::rename(path, &backup).map_err(|e| Error::io(path, e))?;
    Ok(Some(backup))
}

fn swap_in<'a>(
    staged: &[(PathBuf, &'a Path)],
    stale: Option<&'a Path>,
    replaced: &mut Vec<Replaced<'a>>,
) -> Result<()> {
    if let Some(path) = stale {
        if let Some(backup) = set_aside(path)? {
            replaced.push(Replaced {
                path,
                backup: Some(backup),
                written: false,
            });
        }
    }
    for (tmp, path) in staged {
        let path = *path;
        let backup = set_aside(path)?;
        let index = replaced.len();
        replaced.push(Replaced {
            path,
            backup,
            written: false,
        });
        fs::rename(tmp, path).map_err(|e| Error::io(path, e))?;
        replaced[index].written = true;
    }
    Ok(())
}

/// Undoes [`swap_in`], newest first.
fn rollback(replaced: &[Replaced]) {
    for entry in replaced.iter().rev() {
        if entry.written {
            if let Err(e) = fs::remove_file(entry.path) {
                warn!("could not remove {}: {}", entry.path.display(), e);
            }
        }
        if let Some(backup) = &entry.backup {
            if let Err(e) = fs::rename(backup, entry.path) {
                warn!(
                    "could not restore {} from {}: {}",
                    entry.path.display(),
                    backup.display(),
                    e
                );
            }
        }
    }
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        match fs::remove_file(tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove {}: {}", tmp.display(), e),
        }
    }
}
