use hullmedia_db::UploadResultRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::uploads::{SessionRepository, SessionState, TempUploadDir};

/// Periodically evicts idle upload sessions and purges expired upload results.
pub struct SessionSweeper {
    sessions: Arc<dyn SessionRepository>,
    temp: TempUploadDir,
    registry: Arc<dyn UploadResultRegistry>,
    idle_timeout: Duration,
    sweep_interval: Duration,
}

/// Counts from one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted_sessions: usize,
    pub purged_results: u64,
}

impl SessionSweeper {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        temp: TempUploadDir,
        registry: Arc<dyn UploadResultRegistry>,
        idle_timeout: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            sessions,
            temp,
            registry,
            idle_timeout,
            sweep_interval,
        }
    }

    /// Start the background sweep loop
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                let report = self.sweep().await;
                if report != SweepReport::default() {
                    tracing::info!(
                        evicted_sessions = report.evicted_sessions,
                        purged_results = report.purged_results,
                        live_sessions = self.sessions.len(),
                        "Sweep completed"
                    );
                }
            }
        })
    }

    #[tracing::instrument(skip(self), fields(cleanup.operation = "sweep"))]
    pub async fn sweep(&self) -> SweepReport {
        let evicted_sessions = self.evict_idle_sessions().await;

        let purged_results = match self.registry.purge_expired().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Failed to purge expired upload results");
                0
            }
        };

        SweepReport {
            evicted_sessions,
            purged_results,
        }
    }

    /// Sessions that are locked right now are in use and skipped.
    async fn evict_idle_sessions(&self) -> usize {
        let mut evicted = 0;

        for (id, handle) in self.sessions.all() {
            let Ok(mut session) = handle.try_lock() else {
                continue;
            };
            if session.is_closed() || session.idle_for() < self.idle_timeout {
                continue;
            }

            session.state = SessionState::Terminated;
            self.sessions.remove(id);
            self.temp.discard(&session.temp_path).await;

            tracing::info!(
                session_id = %id,
                offset = session.offset,
                idle_secs = session.idle_for().as_secs(),
                "Evicted idle upload session"
            );
            evicted += 1;
        }

        evicted
    }
}
