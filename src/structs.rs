use crate::{background::Background, error::SnapshotError};
use image::imageops::FilterType;
use std::{collections::BTreeMap, path::PathBuf};
use url::Url;

/// Grid position of a tile, as encoded in its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Inclusive rectangle of grid cells covering every located tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_col: i32,
    pub max_col: i32,
    pub min_row: i32,
    pub max_row: i32,
}

impl GridBounds {
    /// Tightest bounds around `coords`, `None` when there are none.
    pub fn enclosing(coords: impl IntoIterator<Item = TileCoord>) -> Option<Self> {
        coords.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => Self {
                    min_col: c.col,
                    max_col: c.col,
                    min_row: c.row,
                    max_row: c.row,
                },
                Some(b) => Self {
                    min_col: b.min_col.min(c.col),
                    max_col: b.max_col.max(c.col),
                    min_row: b.min_row.min(c.row),
                    max_row: b.max_row.max(c.row),
                },
            })
        })
    }

    /// Number of columns. Computed in `u64` so extreme coordinates cannot overflow.
    pub fn width(&self) -> u64 {
        (i64::from(self.max_col) - i64::from(self.min_col) + 1) as u64
    }

    pub fn height(&self) -> u64 {
        (i64::from(self.max_row) - i64::from(self.min_row) + 1) as u64
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_row..=self.max_row)
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| TileCoord { col, row }))
    }
}

/// Everything the locator learned about one map's best zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    pub zoom: u32,
    pub tile_edge: u32,
    pub tiles: BTreeMap<TileCoord, PathBuf>,
    pub bounds: GridBounds,
}

/// Resampling filter used by the post-processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Where to announce a finished snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    pub webhook: Url,
    pub caption: String,
}

/// Immutable parameters of one snapshot run.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    pub scale: Option<f64>,
    /// Target length of the longer output side; wins over `scale`.
    pub fixed_edge: Option<u32>,
    pub background: Option<Background>,
    pub notify: Option<NotifyTarget>,
    pub output_dir: PathBuf,
    pub filter: ResizeFilter,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            scale: None,
            fixed_edge: None,
            background: None,
            notify: None,
            output_dir: PathBuf::from("snapshots"),
            filter: ResizeFilter::default(),
        }
    }
}

impl SnapshotConfig {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if let Some(scale) = self.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(SnapshotError::InvalidScale(scale));
            }
        }

        if self.fixed_edge == Some(0) {
            return Err(SnapshotError::InvalidTileSize(0));
        }

        Ok(())
    }
}
