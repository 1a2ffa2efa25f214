use crate::{
    error::{SchedulerError, SnapshotError},
    pipeline::SnapshotOutcome,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

pub type RunResult = Result<SnapshotOutcome, SnapshotError>;

enum State {
    Idle,
    Running {
        stop: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
}

/// Periodically creates snapshots until stopped.
///
/// Each run is started right after the previous one finished plus the interval,
/// so runs never overlap. Dropping a running scheduler stops it after the
/// current run.
pub struct AutoSnapshotter {
    state: State,
}

impl Default for AutoSnapshotter {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoSnapshotter {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.state, State::Running { task, .. } if !task.is_finished())
    }

    /// Spawns the loop on the current Tokio runtime. `job` runs on the blocking pool.
    ///
    /// Every run's result is sent to the returned receiver, which may be dropped.
    pub fn start<F>(
        &mut self,
        interval: Duration,
        job: F,
    ) -> Result<mpsc::UnboundedReceiver<RunResult>, SchedulerError>
    where
        F: Fn() -> RunResult + Send + Sync + 'static,
    {
        if matches!(self.state, State::Running { .. }) {
            return Err(SchedulerError::AlreadyRunning);
        }

        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let (stop, stop_rx) = watch::channel(false);
        let (reports, reports_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_loop(interval, Arc::new(job), stop_rx, reports));

        log::info!("auto snapshots started, every {interval:?}");

        self.state = State::Running { stop, task };

        Ok(reports_rx)
    }

    /// Stops the loop. Waits for a run in progress to finish but not for the interval.
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        let State::Running { stop, task } = std::mem::replace(&mut self.state, State::Idle) else {
            return Err(SchedulerError::NotRunning);
        };

        // the loop may already be gone if a run panicked
        let _ = stop.send(true);

        if let Err(e) = task.await {
            log::error!("auto snapshot task failed: {e}");
        }

        log::info!("auto snapshots stopped");

        Ok(())
    }
}

async fn run_loop<F>(
    interval: Duration,
    job: Arc<F>,
    mut stop: watch::Receiver<bool>,
    reports: mpsc::UnboundedSender<RunResult>,
) where
    F: Fn() -> RunResult + Send + Sync + 'static,
{
    for iteration in 1_u64.. {
        log::info!("auto snapshot #{iteration}");

        let job = job.clone();

        match tokio::task::spawn_blocking(move || job()).await {
            Ok(result) => {
                match &result {
                    Ok(outcome) => log::info!("auto snapshot #{iteration} saved to {:?}", outcome.path),
                    Err(e) => log::error!("auto snapshot #{iteration} failed: {e}"),
                }

                // nobody listening is fine
                let _ = reports.send(result);
            }
            Err(e) => log::error!("auto snapshot #{iteration} panicked: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop.changed() => {
                // sender dropped, the scheduler is gone
                if changed.is_err() {
                    break;
                }
            }
        }

        if *stop.borrow() {
            break;
        }
    }
}
