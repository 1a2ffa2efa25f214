use crate::structs::TileCoord;
use image::ImageError;
use std::{fmt, path::PathBuf};

/// Fatal failures of a snapshot run. Nothing is written when one of these is returned.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("tiles directory {0:?} does not exist or is not a directory")]
    InvalidRoot(PathBuf),

    #[error("no zoom level directories under {0:?}")]
    NoZoomLevels(PathBuf),

    #[error("map {world}/{map} has no tiles at zoom level {zoom}")]
    EmptyMap {
        world: String,
        map: String,
        zoom: u32,
    },

    #[error("corrupt tile {path:?}: {source}")]
    CorruptTile {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("invalid world or map name {0:?}, must be a single path component")]
    InvalidName(String),

    #[error("invalid scale {0}, must be a positive number")]
    InvalidScale(f64),

    #[error("invalid output edge length {0}, must be positive")]
    InvalidTileSize(u32),

    #[error("canvas of {cols}x{rows} tiles of {tile_edge}px is too large")]
    CanvasTooLarge { cols: u64, rows: u64, tile_edge: u32 },

    #[error("error writing snapshot {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A notification that could not be delivered. The snapshot itself is unaffected.
#[derive(thiserror::Error, Debug)]
pub enum NotificationError {
    #[error("error reading snapshot for upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("error encoding notification payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected upload with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Why a single grid cell was filled instead of copied.
#[derive(Debug)]
pub enum TileIssue {
    Decode(ImageError),
    SizeMismatch { expected: u32, width: u32, height: u32 },
    Duplicate { kept: PathBuf },
}

/// Non-fatal problem with one tile, accumulated during a run.
#[derive(Debug)]
pub struct TileWarning {
    pub coord: TileCoord,
    pub path: PathBuf,
    pub issue: TileIssue,
}

impl fmt::Display for TileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile {:?} at ({}, {}): ", self.path, self.coord.col, self.coord.row)?;

        match &self.issue {
            TileIssue::Decode(e) => write!(f, "decode failed: {e}"),
            TileIssue::SizeMismatch {
                expected,
                width,
                height,
            } => write!(f, "size {width}x{height} differs from tile size {expected}"),
            TileIssue::Duplicate { kept } => write!(f, "duplicate of {kept:?}, ignored"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("auto snapshots are already running")]
    AlreadyRunning,

    #[error("auto snapshots are not running")]
    NotRunning,

    #[error("interval must be longer than zero")]
    ZeroInterval,
}
