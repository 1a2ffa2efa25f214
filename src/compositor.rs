use crate::{
    background::Background,
    error::{SnapshotError, TileIssue, TileWarning},
    structs::{TileCoord, TileSet},
};
use image::{RgbaImage, imageops};
use std::path::Path;

/// Canvas plus the tiles that had to be filled instead of copied.
pub struct Composite {
    pub canvas: RgbaImage,
    pub warnings: Vec<TileWarning>,
}

/// Stitches every tile of `set` into one canvas.
///
/// Tile pixels are copied verbatim, alpha included. Cells without a usable
/// tile are filled with `background`, or left fully transparent.
pub fn composite(set: &TileSet, background: Option<Background>) -> Result<Composite, SnapshotError> {
    let edge = set.tile_edge;

    let too_large = || SnapshotError::CanvasTooLarge {
        cols: set.bounds.width(),
        rows: set.bounds.height(),
        tile_edge: edge,
    };

    let width = u32::try_from(set.bounds.width() * u64::from(edge)).map_err(|_| too_large())?;
    let height = u32::try_from(set.bounds.height() * u64::from(edge)).map_err(|_| too_large())?;

    // RgbaImage::new panics rather than failing when the buffer length overflows usize
    u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4))
        .and_then(|len| usize::try_from(len).ok())
        .ok_or_else(too_large)?;

    match background {
        Some(background) => {
            log::debug!("allocating {width}x{height} canvas, gaps filled with {background}");
        }
        None => log::debug!("allocating {width}x{height} canvas, gaps left transparent"),
    }

    let mut canvas = RgbaImage::new(width, height);
    let mut warnings = Vec::new();

    for cell in set.bounds.cells() {
        let x = (i64::from(cell.col) - i64::from(set.bounds.min_col)) as u32 * edge;
        let y = (i64::from(cell.row) - i64::from(set.bounds.min_row)) as u32 * edge;

        let tile = set
            .tiles
            .get(&cell)
            .and_then(|path| match load_tile(path, cell, edge) {
                Ok(tile) => Some(tile),
                Err(warning) => {
                    log::warn!("{warning}");

                    warnings.push(warning);

                    None
                }
            });

        match (tile, background) {
            (Some(tile), _) => imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y)),
            (None, Some(background)) => fill(&mut canvas, x, y, edge, background),
            (None, None) => {} // already transparent
        }
    }

    Ok(Composite { canvas, warnings })
}

fn load_tile(path: &Path, coord: TileCoord, edge: u32) -> Result<RgbaImage, TileWarning> {
    let warning = |issue| TileWarning {
        coord,
        path: path.to_path_buf(),
        issue,
    };

    let tile = image::open(path)
        .map_err(|e| warning(TileIssue::Decode(e)))?
        .into_rgba8();

    if tile.dimensions() != (edge, edge) {
        return Err(warning(TileIssue::SizeMismatch {
            expected: edge,
            width: tile.width(),
            height: tile.height(),
        }));
    }

    Ok(tile)
}

fn fill(canvas: &mut RgbaImage, x: u32, y: u32, edge: u32, background: Background) {
    for py in y..y + edge {
        for px in x..x + edge {
            canvas.put_pixel(px, py, background.0);
        }
    }
}
