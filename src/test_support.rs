//! Fixture helpers shared by unit tests.

use image::{Rgba, RgbaImage};
use std::{fs, path::Path};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Creates `<root>/<world>/<map>/<zoom>` and returns it.
pub fn zoom_dir(root: &Path, world: &str, map: &str, zoom: u32) -> std::path::PathBuf {
    let dir = root.join(world).join(map).join(zoom.to_string());

    fs::create_dir_all(&dir).unwrap();

    dir
}

/// Writes a solid `edge`x`edge` PNG tile named `<col>_<row>.png`.
pub fn write_tile(dir: &Path, col: i32, row: i32, edge: u32, color: Rgba<u8>) {
    RgbaImage::from_pixel(edge, edge, color)
        .save(dir.join(format!("{col}_{row}.png")))
        .unwrap();
}
