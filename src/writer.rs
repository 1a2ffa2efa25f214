use crate::error::SnapshotError;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

const SNAPSHOT_EXTENSION: &str = "png";

/// Sortable and precise to the microsecond.
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%6f";

/// Rejects names that would put a snapshot outside its directory.
pub fn check_name(name: &str) -> Result<(), SnapshotError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(SnapshotError::InvalidName(name.to_owned()));
    }

    Ok(())
}

/// Writes `canvas` as `<dir>/<world>_<map>_<timestamp>.png` and returns the path.
///
/// Never overwrites: if the name is taken, `_1`, `_2`, ... is appended to the stem.
pub fn persist(
    canvas: &RgbaImage,
    dir: &Path,
    world: &str,
    map: &str,
) -> Result<PathBuf, SnapshotError> {
    persist_at(canvas, dir, world, map, Utc::now())
}

fn persist_at(
    canvas: &RgbaImage,
    dir: &Path,
    world: &str,
    map: &str,
    time: DateTime<Utc>,
) -> Result<PathBuf, SnapshotError> {
    check_name(world)?;
    check_name(map)?;

    fs::create_dir_all(dir).map_err(|source| SnapshotError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let stem = format!("{world}_{map}_{}", time.format(TIMESTAMP_FORMAT));

    let (path, file) = create_unique(dir, &stem).map_err(|source| SnapshotError::Write {
        path: dir.join(&stem),
        source,
    })?;

    if let Err(source) = encode(canvas, file) {
        // a half-written snapshot is worse than none
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("error removing partial snapshot {path:?}: {e}");
        }

        return Err(SnapshotError::Write { path, source });
    }

    log::info!("saved {path:?}");

    Ok(path)
}

fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
    for n in 0_u32.. {
        let path = if n == 0 {
            dir.join(format!("{stem}.{SNAPSHOT_EXTENSION}"))
        } else {
            dir.join(format!("{stem}_{n}.{SNAPSHOT_EXTENSION}"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{path:?} exists, trying next suffix");
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(ErrorKind::AlreadyExists, "no free snapshot name"))
}

fn encode(canvas: &RgbaImage, file: File) -> io::Result<()> {
    let mut out = BufWriter::new(file);

    canvas
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| match e {
            image::ImageError::IoError(e) => e,
            e => io::Error::other(e),
        })?;

    out.flush()?;

    out.into_inner().map_err(|e| e.into_error())?.sync_all()
}
