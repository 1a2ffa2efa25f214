use crate::{
    error::{SnapshotError, TileIssue, TileWarning},
    structs::{GridBounds, TileCoord, TileSet},
};
use image::{
    ImageError,
    error::{ParameterError, ParameterErrorKind},
};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    fs, io,
    path::{Path, PathBuf},
};

const TILE_EXTENSION: &str = "png";

/// Finds the tiles of the highest zoom level of `world`/`map` and their bounds.
///
/// Unparseable file names are skipped. Duplicate coordinates are reported in
/// the returned warnings and only the first file, in path order, is kept.
pub fn locate_tiles(
    root: &Path,
    world: &str,
    map: &str,
) -> Result<(TileSet, Vec<TileWarning>), SnapshotError> {
    if !root.is_dir() {
        return Err(SnapshotError::InvalidRoot(root.to_path_buf()));
    }

    let map_dir = root.join(world).join(map);

    let (zoom, zoom_dir) =
        highest_zoom(&map_dir).ok_or_else(|| SnapshotError::NoZoomLevels(map_dir.clone()))?;

    let (tiles, warnings) = collect_tiles(&zoom_dir).map_err(|e| {
        log::warn!("error listing {zoom_dir:?}: {e}");

        SnapshotError::NoZoomLevels(map_dir.clone())
    })?;

    let empty = || SnapshotError::EmptyMap {
        world: world.to_owned(),
        map: map.to_owned(),
        zoom,
    };

    let bounds = GridBounds::enclosing(tiles.keys().copied()).ok_or_else(empty)?;

    // the smallest coordinate is as good as any, and keeps reruns identical
    let probe = tiles.values().next().ok_or_else(empty)?;

    let tile_edge = probe_tile_edge(probe)?;

    log::info!(
        "{world}/{map}: zoom {zoom}, {} tiles of {tile_edge}px, columns {}..={}, rows {}..={}",
        tiles.len(),
        bounds.min_col,
        bounds.max_col,
        bounds.min_row,
        bounds.max_row
    );

    Ok((
        TileSet {
            zoom,
            tile_edge,
            tiles,
            bounds,
        },
        warnings,
    ))
}

/// Highest integer-named directory and its actual path, so `03` is read as `03`.
fn highest_zoom(map_dir: &Path) -> Option<(u32, PathBuf)> {
    fs::read_dir(map_dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| Some((path.file_name()?.to_str()?.parse::<u32>().ok()?, path)))
        .max()
}

fn collect_tiles(
    zoom_dir: &Path,
) -> io::Result<(BTreeMap<TileCoord, PathBuf>, Vec<TileWarning>)> {
    let mut paths = fs::read_dir(zoom_dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()?;

    paths.sort();

    let mut tiles = BTreeMap::new();
    let mut warnings = Vec::new();

    for path in paths {
        if !path.is_file() {
            continue;
        }

        let Some(coord) = parse_tile_name(&path) else {
            log::debug!("skipping {path:?}, not a tile");

            continue;
        };

        match tiles.entry(coord) {
            Entry::Vacant(entry) => {
                entry.insert(path);
            }
            Entry::Occupied(entry) => {
                let warning = TileWarning {
                    coord,
                    path,
                    issue: TileIssue::Duplicate {
                        kept: entry.get().clone(),
                    },
                };

                log::warn!("{warning}");

                warnings.push(warning);
            }
        }
    }

    Ok((tiles, warnings))
}

/// Parses `<col>_<row>.png` into grid coordinates.
pub fn parse_tile_name(path: &Path) -> Option<TileCoord> {
    let extension = path.extension()?.to_str()?;

    if !extension.eq_ignore_ascii_case(TILE_EXTENSION) {
        return None;
    }

    let (col, row) = path.file_stem()?.to_str()?.split_once('_')?;

    Some(TileCoord::new(col.parse().ok()?, row.parse().ok()?))
}

fn probe_tile_edge(path: &Path) -> Result<u32, SnapshotError> {
    let (width, height) =
        image::image_dimensions(path).map_err(|source| SnapshotError::CorruptTile {
            path: path.to_path_buf(),
            source,
        })?;

    if width != height || width == 0 {
        return Err(SnapshotError::CorruptTile {
            path: path.to_path_buf(),
            source: ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            )),
        });
    }

    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RED, write_tile, zoom_dir};
    use image::RgbaImage;
    use tempfile::TempDir;

    #[test]
    fn parses_signed_coordinates() {
        assert_eq!(parse_tile_name(Path::new("a/-3_12.png")), Some(TileCoord::new(-3, 12)));
        assert_eq!(parse_tile_name(Path::new("0_-1.PNG")), Some(TileCoord::new(0, -1)));
    }

    #[test]
    fn rejects_foreign_names() {
        for name in ["1_2.jpg", "1_2", "1-2.png", "a_2.png", "1_2_3.png", "_1.png", "1_.png"] {
            assert_eq!(parse_tile_name(Path::new(name)), None, "{name}");
        }
    }

    #[test]
    fn picks_highest_zoom_and_bounds() {
        let root = TempDir::new().unwrap();

        let low = zoom_dir(root.path(), "earth", "surface", 0);
        write_tile(&low, 40, 40, 16, RED);

        let high = zoom_dir(root.path(), "earth", "surface", 3);
        write_tile(&high, -1, -1, 16, RED);
        write_tile(&high, 0, 0, 16, RED);
        write_tile(&high, 2, -3, 16, RED);
        fs::write(high.join("notes.txt"), "").unwrap();
        fs::write(high.join("x_y.png"), "").unwrap();

        fs::create_dir_all(root.path().join("earth/surface/cache")).unwrap();

        let (set, warnings) = locate_tiles(root.path(), "earth", "surface").unwrap();

        assert!(warnings.is_empty());
        assert_eq!(set.zoom, 3);
        assert_eq!(set.tile_edge, 16);
        assert_eq!(set.tiles.len(), 3);
        assert_eq!(
            set.bounds,
            GridBounds {
                min_col: -1,
                max_col: 2,
                min_row: -3,
                max_row: 0
            }
        );
    }

    #[test]
    fn zero_padded_zoom_directory_is_read_under_its_own_name() {
        let root = TempDir::new().unwrap();
        let padded = root.path().join("w/m/03");

        fs::create_dir_all(&padded).unwrap();
        write_tile(&padded, 0, 0, 8, RED);

        let (set, _) = locate_tiles(root.path(), "w", "m").unwrap();

        assert_eq!(set.zoom, 3);
        assert_eq!(set.tiles[&TileCoord::new(0, 0)], padded.join("0_0.png"));
    }

    #[test]
    fn signed_zoom_name_beats_lower_zoom() {
        let root = TempDir::new().unwrap();
        let low = zoom_dir(root.path(), "w", "m", 2);
        let high = root.path().join("w/m/+3");

        fs::create_dir_all(&high).unwrap();
        write_tile(&low, 0, 0, 8, RED);
        write_tile(&high, 5, 5, 8, RED);

        let (set, _) = locate_tiles(root.path(), "w", "m").unwrap();

        assert_eq!(set.zoom, 3);
        assert_eq!(set.tiles.keys().copied().collect::<Vec<_>>(), vec![TileCoord::new(5, 5)]);
    }

    #[test]
    fn missing_root_is_invalid() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("tiles");

        assert!(matches!(
            locate_tiles(&missing, "w", "m"),
            Err(SnapshotError::InvalidRoot(p)) if p == missing
        ));
    }

    #[test]
    fn rerun_on_unchanged_tiles_is_identical() {
        let root = TempDir::new().unwrap();
        let dir = zoom_dir(root.path(), "w", "m", 1);

        for (col, row) in [(5, 1), (-2, 0), (3, 3), (0, -7)] {
            write_tile(&dir, col, row, 8, RED);
        }

        let (first, _) = locate_tiles(root.path(), "w", "m").unwrap();
        let (second, _) = locate_tiles(root.path(), "w", "m").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_coordinates_keep_first_path() {
        let root = TempDir::new().unwrap();
        let dir = zoom_dir(root.path(), "w", "m", 0);

        write_tile(&dir, 1, 2, 8, RED);
        RgbaImage::from_pixel(8, 8, RED).save(dir.join("01_2.png")).unwrap();

        let (set, warnings) = locate_tiles(root.path(), "w", "m").unwrap();

        assert_eq!(set.tiles[&TileCoord::new(1, 2)], dir.join("01_2.png"));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0].issue,
            TileIssue::Duplicate { kept } if *kept == dir.join("01_2.png")
        ));
    }

    #[test]
    fn empty_zoom_level_is_empty_map() {
        let root = TempDir::new().unwrap();
        zoom_dir(root.path(), "earth", "surface", 2);

        assert!(matches!(
            locate_tiles(root.path(), "earth", "surface"),
            Err(SnapshotError::EmptyMap { zoom: 2, .. })
        ));
    }

    #[test]
    fn no_numeric_zoom_directories() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("earth/surface/tiles")).unwrap();

        assert!(matches!(
            locate_tiles(root.path(), "earth", "surface"),
            Err(SnapshotError::NoZoomLevels(_))
        ));
        assert!(matches!(
            locate_tiles(root.path(), "earth", "missing"),
            Err(SnapshotError::NoZoomLevels(_))
        ));
    }

    #[test]
    fn unreadable_probe_tile_is_fatal() {
        let root = TempDir::new().unwrap();
        let dir = zoom_dir(root.path(), "w", "m", 0);

        fs::write(dir.join("0_0.png"), b"definitely not a png").unwrap();
        write_tile(&dir, 1, 1, 8, RED);

        assert!(matches!(
            locate_tiles(root.path(), "w", "m"),
            Err(SnapshotError::CorruptTile { path, .. }) if path == dir.join("0_0.png")
        ));
    }

    #[test]
    fn non_square_probe_tile_is_fatal() {
        let root = TempDir::new().unwrap();
        let dir = zoom_dir(root.path(), "w", "m", 0);

        RgbaImage::from_pixel(8, 4, RED).save(dir.join("0_0.png")).unwrap();

        assert!(matches!(
            locate_tiles(root.path(), "w", "m"),
            Err(SnapshotError::CorruptTile { .. })
        ));
    }
}
