mod background;
mod catalog;
mod compositor;
mod error;
mod locator;
mod notify;
mod pipeline;
mod resize;
mod scheduler;
mod structs;
mod writer;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result, bail};
use background::Background;
use clap::{Parser, Subcommand};
use pipeline::{SnapshotJob, SnapshotOutcome};
use scheduler::AutoSnapshotter;
use std::{
    io::{Write, stdout},
    path::PathBuf,
    time::Duration,
};
use structs::{NotifyTarget, ResizeFilter, SnapshotConfig};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// More logging, repeat for even more. RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List worlds under the tiles directory
    Worlds {
        /// Tiles directory
        #[arg(short, long)]
        tiles: PathBuf,
    },

    /// List maps of a world
    Maps {
        /// Tiles directory
        #[arg(short, long)]
        tiles: PathBuf,

        #[arg(short, long)]
        world: String,
    },

    /// Create one snapshot
    Snapshot(SnapshotArgs),

    /// Create snapshots periodically until interrupted
    Auto {
        /// Seconds between the end of one snapshot and the start of the next
        #[arg(long)]
        every: u64,

        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
}

#[derive(clap::Args, Debug)]
struct SnapshotArgs {
    /// Tiles directory
    #[arg(short, long)]
    tiles: PathBuf,

    #[arg(short, long)]
    world: String,

    #[arg(short, long)]
    map: String,

    /// Uniform scale factor, e.g. 0.5
    #[arg(short, long)]
    scale: Option<f64>,

    /// Length of the longer output side in pixels. Wins over --scale
    #[arg(short, long)]
    edge: Option<u32>,

    /// Fill color for missing tiles as RRGGBB. Default transparent
    #[arg(short, long)]
    background: Option<Background>,

    /// Snapshots directory
    #[arg(short, long, default_value = "snapshots")]
    output: PathBuf,

    /// Resampling filter
    #[arg(short, long, value_enum, default_value_t)]
    filter: ResizeFilter,

    /// Discord webhook to post the snapshot to
    #[arg(long)]
    webhook: Option<Url>,

    /// Message posted with the snapshot
    #[arg(long, default_value = "", requires = "webhook")]
    caption: String,
}

impl SnapshotArgs {
    fn into_job(self) -> Result<SnapshotJob> {
        let config = SnapshotConfig {
            scale: self.scale,
            fixed_edge: self.edge,
            background: self.background,
            notify: self.webhook.map(|webhook| NotifyTarget {
                webhook,
                caption: self.caption,
            }),
            output_dir: self.output,
            filter: self.filter,
        };

        config.validate()?;

        Ok(SnapshotJob {
            root: self.tiles,
            world: self.world,
            map: self.map,
            config,
        })
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    match args.command {
        Command::Worlds { tiles } => {
            for world in catalog::list_worlds(&tiles)? {
                println!("{world}");
            }
        }
        Command::Maps { tiles, world } => {
            catalog::list_worlds(&tiles)?;

            for map in catalog::list_maps(&tiles, &world) {
                println!("{map}");
            }
        }
        Command::Snapshot(snapshot) => {
            let job = snapshot.into_job()?;

            let outcome = tokio::task::spawn_blocking(move || job.run())
                .await
                .context("snapshot task failed")??;

            report(&outcome);
        }
        Command::Auto { every, snapshot } => {
            if every == 0 {
                bail!("--every must be at least one second");
            }

            let job = snapshot.into_job()?;

            let mut scheduler = AutoSnapshotter::new();

            let mut reports = scheduler.start(Duration::from_secs(every), move || job.run())?;

            println!("Taking a snapshot every {every}s, press Ctrl-C to stop.");

            loop {
                tokio::select! {
                    signal = tokio::signal::ctrl_c() => {
                        signal?;

                        break;
                    }
                    result = reports.recv() => match result {
                        Some(Ok(outcome)) => report(&outcome),
                        Some(Err(e)) => eprintln!("Snapshot failed: {e}"),
                        None => break,
                    },
                }
            }

            if !scheduler.is_running() {
                log::warn!("auto snapshot loop ended unexpectedly");
            }

            print!("Stopping ...");

            stdout().flush()?;

            scheduler.stop().await?;

            println!(" done.");
        }
    }

    Ok(())
}

/// Prints the result, keeping notification trouble apart from the snapshot itself.
fn report(outcome: &SnapshotOutcome) {
    println!(
        "Snapshot {}x{} from zoom level {} saved to {}",
        outcome.width,
        outcome.height,
        outcome.zoom,
        outcome.path.display()
    );

    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }

    if let Some(Err(e)) = &outcome.notification {
        eprintln!("Warning: snapshot saved but not posted: {e}");
    }
}
