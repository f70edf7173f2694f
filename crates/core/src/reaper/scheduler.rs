//! Background task driving reaper cycles.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cycle::{ReapReport, Reaper, ReaperConfig};

enum Command {
    RunNow(oneshot::Sender<ReapReport>),
}

/// Handle to a running reaper task.
///
/// Dropping the handle without calling [`ReaperHandle::shutdown`] also stops
/// the task once its current cycle finishes.
pub struct ReaperHandle {
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Spawns reaper tasks.
pub struct ReaperScheduler;

impl ReaperScheduler {
    /// Start running `reaper` every `config.interval`.
    ///
    /// The first cycle runs one interval after start. Missed ticks are
    /// skipped, so a slow cycle never triggers a burst of catch-up cycles.
    #[must_use]
    pub fn spawn(reaper: Reaper, config: &ReaperConfig) -> ReaperHandle {
        let (commands, mut rx) = mpsc::channel::<Command>(8);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let interval = config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            info!(interval_secs = interval.as_secs(), "reaper started");
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        reaper.run_cycle(Utc::now()).await;
                    }
                    command = rx.recv() => match command {
                        Some(Command::RunNow(reply)) => {
                            let report = reaper.run_cycle(Utc::now()).await;
                            if reply.send(report).is_err() {
                                debug!("run-now requester went away");
                            }
                        }
                        None => break,
                    },
                }
            }
            info!("reaper stopped");
        });

        ReaperHandle {
            commands,
            cancel,
            task,
        }
    }
}

impl ReaperHandle {
    /// Run a cycle immediately and wait for its report.
    ///
    /// Returns `None` if the task has stopped.
    pub async fn run_now(&self) -> Option<ReapReport> {
        let (reply, report) = oneshot::channel();
        self.commands.send(Command::RunNow(reply)).await.ok()?;
        report.await.ok()
    }

    /// Token that stops the task when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the task, letting an in-flight cycle finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "reaper task ended abnormally");
        }
    }
}
