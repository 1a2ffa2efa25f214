use crate::{
    compositor::{Composite, composite},
    error::{NotificationError, SnapshotError, TileWarning},
    locator::locate_tiles,
    notify::{DiscordWebhook, Notifier},
    resize::resize,
    structs::SnapshotConfig,
    writer::{check_name, persist},
};
use std::path::{Path, PathBuf};
use url::Url;

/// A written snapshot and everything that went wrong without stopping it.
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub zoom: u32,
    pub warnings: Vec<TileWarning>,
    /// `None` when no notification was configured.
    pub notification: Option<Result<(), NotificationError>>,
}

/// One (world, map) snapshot request, owned so it can move onto a worker thread.
#[derive(Debug, Clone)]
pub struct SnapshotJob {
    pub root: PathBuf,
    pub world: String,
    pub map: String,
    pub config: SnapshotConfig,
}

impl SnapshotJob {
    /// Runs the pipeline, posting to the configured webhook if any. Blocks.
    pub fn run(&self) -> Result<SnapshotOutcome, SnapshotError> {
        self.run_with(DiscordWebhook::new)
    }

    /// Runs the pipeline with the notifier `connect` builds for the configured webhook.
    ///
    /// A notifier that cannot be built does not stop the snapshot, its error
    /// ends up in the outcome.
    fn run_with<N, F>(&self, connect: F) -> Result<SnapshotOutcome, SnapshotError>
    where
        N: Notifier,
        F: FnOnce(Url) -> Result<N, NotificationError>,
    {
        let connected = self
            .config
            .notify
            .as_ref()
            .map(|target| connect(target.webhook.clone()))
            .transpose();

        let notifier = match connected {
            Ok(notifier) => notifier,
            Err(e) => {
                log::warn!("cannot set up notification: {e}");

                let mut outcome =
                    create_snapshot(&self.root, &self.world, &self.map, &self.config, None)?;

                outcome.notification = Some(Err(e));

                return Ok(outcome);
            }
        };

        create_snapshot(
            &self.root,
            &self.world,
            &self.map,
            &self.config,
            notifier.as_ref().map(|notifier| notifier as &dyn Notifier),
        )
    }
}

/// Locates, stitches, resizes and writes one snapshot, then hands it to `notifier`.
///
/// Configuration and names are validated before anything is read. A notification failure
/// is returned inside the outcome, never as an error.
pub fn create_snapshot(
    root: &Path,
    world: &str,
    map: &str,
    config: &SnapshotConfig,
    notifier: Option<&dyn Notifier>,
) -> Result<SnapshotOutcome, SnapshotError> {
    config.validate()?;
    check_name(world)?;
    check_name(map)?;

    let (set, mut warnings) = locate_tiles(root, world, map)?;

    let Composite {
        canvas,
        warnings: tile_warnings,
    } = composite(&set, config.background)?;

    warnings.extend(tile_warnings);

    let canvas = resize(canvas, config.scale, config.fixed_edge, config.filter)?;

    let path = persist(&canvas, &config.output_dir, world, map)?;

    let notification = notifier.map(|notifier| {
        let caption = config
            .notify
            .as_ref()
            .map(|target| target.caption.as_str())
            .unwrap_or_default();

        notifier.notify(&path, caption).inspect_err(|e| {
            log::warn!("snapshot {path:?} saved but notification failed: {e}");
        })
    });

    Ok(SnapshotOutcome {
        path,
        width: canvas.width(),
        height: canvas.height(),
        zoom: set.zoom,
        warnings,
        notification,
    })
}
