use crate::error::SnapshotError;
use std::{fs, io, path::Path};

/// World names under the tiles root, sorted.
pub fn list_worlds(root: &Path) -> Result<Vec<String>, SnapshotError> {
    if !root.is_dir() {
        return Err(SnapshotError::InvalidRoot(root.to_path_buf()));
    }

    subdirectory_names(root).map_err(|e| {
        log::warn!("error listing {root:?}: {e}");

        SnapshotError::InvalidRoot(root.to_path_buf())
    })
}

/// Map names of `world`. Empty when the world does not exist.
pub fn list_maps(root: &Path, world: &str) -> Vec<String> {
    let world_dir = root.join(world);

    subdirectory_names(&world_dir).unwrap_or_else(|e| {
        log::debug!("no maps under {world_dir:?}: {e}");

        Vec::new()
    })
}

fn subdirectory_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;

        // follows symlinks, a linked world directory is still a world
        if !entry.path().is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::debug!("skipping non UTF-8 directory {name:?}"),
        }
    }

    names.sort();

    Ok(names)
}
