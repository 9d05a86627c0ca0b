//! Periodic driver for the sync engine.
//!
//! Fires a cycle immediately, then once per interval. Every tick launches
//! its own cycle task; the scheduler never skips or merges ticks itself, so a
//! cycle that overruns its interval causes the next tick's cycle to bounce
//! off the engine's single-flight guard.

use crate::error::{AgentError, AgentResult};
use crate::sync_engine::SyncEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Commands accepted by a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Launch a cycle now, in addition to the regular ticks.
    SyncNow,
    /// Stop ticking and wait for in-flight cycles to finish.
    Stop,
}

/// Handle for sending commands to the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    pub async fn stop(&self) -> AgentResult<()> {
        self.command_tx
            .send(SchedulerCommand::Stop)
            .await
            .map_err(|_| AgentError::SchedulerStopped)
    }

    pub async fn sync_now(&self) -> AgentResult<()> {
        self.command_tx
            .send(SchedulerCommand::SyncNow)
            .await
            .map_err(|_| AgentError::SchedulerStopped)
    }
}

/// Periodic sync loop.
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    interval: Duration,
    command_rx: mpsc::Receiver<SchedulerCommand>,
    cycles: JoinSet<()>,
}

/// Creates a scheduler and its command handle.
pub fn create_scheduler(engine: Arc<SyncEngine>, interval: Duration) -> (SchedulerHandle, Scheduler) {
    let (command_tx, command_rx) = mpsc::channel(16);

    let scheduler = Scheduler {
        engine,
        interval,
        command_rx,
        cycles: JoinSet::new(),
    };

    (SchedulerHandle { command_tx }, scheduler)
}

impl Scheduler {
    /// Runs until stopped via the handle, or until every handle is dropped.
    pub async fn run(mut self) {
        info!("scheduler started, syncing every {}s", self.interval.as_secs());

        // First tick completes immediately: that is the startup sync.
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.launch(),
                Some(joined) = self.cycles.join_next(), if !self.cycles.is_empty() => {
                    if let Err(e) = joined {
                        error!("sync cycle task failed: {e}");
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::SyncNow) => {
                            debug!("manual sync requested");
                            self.launch();
                        }
                        Some(SchedulerCommand::Stop) => {
                            info!("scheduler stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping scheduler");
                            break;
                        }
                    }
                }
            }
        }

        while let Some(joined) = self.cycles.join_next().await {
            if let Err(e) = joined {
                error!("sync cycle task failed: {e}");
            }
        }
        info!("scheduler stopped");
    }

    fn launch(&mut self) {
        let engine = Arc::clone(&self.engine);
        self.cycles.spawn(async move {
            match engine.run_cycle().await {
                Ok(_) => {}
                Err(AgentError::AlreadySyncing) => {
                    info!("previous sync still running, skipping this tick");
                }
                // The engine has already logged the cause.
                Err(e) => debug!("sync cycle failed: {e}"),
            }
        });
    }
}
