//! Job lifecycle tracking.
//!
//! Once a job is submitted, the provider processes it on its own schedule.
//! The tracker keeps the local record in step with the provider:
//!
//! - one background monitor per in-flight job, polling until the job is
//!   terminal or its attempt budget runs out
//! - on demand refreshes from the status endpoint
//! - resuming monitors for unfinished jobs after a restart
//!
//! The tracker runs as a background task that owns the running monitors and
//! processes [`TrackerEvent`]s sent through [`JobTracker`].

pub mod reconcile;
#[cfg(test)]
mod scripted;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{Receiver, Sender, channel};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::models::job::{JobDb, JobUpdate};
use crate::prelude::*;
use crate::provider::{Application, ImageProvider};
use crate::store::Store;
use reconcile::{RemoteState, check_remote, reconcile};

/// Polling cadence of background monitors.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    /// Reconciliation rounds per job, counted across restarts.
    pub max_attempts: i32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

/// Events that can be sent to the tracker.
#[derive(Debug)]
pub enum TrackerEvent {
    Monitor { job_id: i32 },
    MonitorFinished { job_id: i32, monitor_id: u64 },
    Shutdown,
}

#[derive(Clone)]
pub struct JobTracker {
    tx: Sender<TrackerEvent>,
    store: Arc<dyn Store>,
    provider: Arc<dyn ImageProvider>,
    settings: TrackerSettings,
}

struct RunningMonitor {
    monitor_id: u64,
    handle: JoinHandle<()>,
}

struct TrackerPrivate {
    tracker: JobTracker,
    monitors: HashMap<i32, RunningMonitor>,
    next_monitor_id: u64,
}

impl JobTracker {
    /// Creates the tracker and starts its background task.
    pub fn create(
        store: Arc<dyn Store>,
        provider: Arc<dyn ImageProvider>,
        settings: TrackerSettings,
    ) -> (JobTracker, JoinHandle<()>) {
        let (tx, rx) = channel(32);
        let tracker = JobTracker {
            tx,
            store,
            provider,
            settings,
        };
        let private = TrackerPrivate {
            tracker: tracker.clone(),
            monitors: HashMap::new(),
            next_monitor_id: 0,
        };
        let handle = private.start_thread(rx);
        (tracker, handle)
    }

    /// Starts a background monitor for `job_id` unless one is already running.
    pub async fn monitor(&self, job_id: i32) -> Result<()> {
        self.tx
            .send(TrackerEvent::Monitor { job_id })
            .await
            .map_err(|_| Error::TrackerStopped)
    }

    /// Starts monitors for every job left unfinished by a previous run.
    pub async fn resume(&self) -> Result<usize> {
        let jobs = self.store.fetch_unfinished_jobs()?;
        for job in &jobs {
            self.monitor(job.id).await?;
        }
        info!("Resumed monitoring of {} unfinished jobs", jobs.len());
        Ok(jobs.len())
    }

    /// Stops the background task and aborts every running monitor.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(TrackerEvent::Shutdown)
            .await
            .map_err(|_| Error::TrackerStopped)
    }

    /// Reconciles `job` with the provider once and returns the stored result.
    ///
    /// Terminal jobs and jobs without a provider request are returned as is.
    /// Provider failures are logged; the job keeps its stored status.
    pub async fn refresh(&self, job: JobDb) -> Result<JobDb> {
        let Some(request_id) = job.provider_request_id.clone() else {
            return Ok(job);
        };
        if job.status.is_terminal() {
            return Ok(job);
        }

        let application = Application::from_id(&job.application)?;
        let remote = check_remote(self.provider.as_ref(), application, &request_id).await;
        if let RemoteState::Pending { error: Some(err) } = &remote {
            warn!("Job {}: {err}", job.id);
        }

        let Some(update) = reconcile(&job, &remote) else {
            return Ok(job);
        };
        match self.store.update_job(job.id, &update)? {
            Some(updated) => {
                info!("Job {} is now {}", updated.id, updated.status);
                Ok(updated)
            }
            None => Ok(self.store.fetch_job(job.id)?.unwrap_or(job)),
        }
    }

    /// Runs one monitoring round for `job_id`.
    ///
    /// Returns whether the job still needs monitoring.
    async fn poll_once(&self, job_id: i32) -> Result<bool> {
        let Some(job) = self.store.fetch_job(job_id)? else {
            warn!("Job {job_id} disappeared while being monitored");
            return Ok(false);
        };
        let Some(request_id) = job.provider_request_id.clone() else {
            return Ok(false);
        };
        if job.status.is_terminal() {
            return Ok(false);
        }
        if job.poll_attempts >= self.settings.max_attempts {
            info!(
                "Stopped monitoring job {job_id} after {} attempts",
                job.poll_attempts
            );
            return Ok(false);
        }

        let application = Application::from_id(&job.application)?;
        let remote = check_remote(self.provider.as_ref(), application, &request_id).await;
        debug!("Job {job_id} remote state {:?}", remote);

        let attempts = job.poll_attempts + 1;
        let mut update = reconcile(&job, &remote).unwrap_or_default();
        update.poll_attempts = Some(attempts);

        let stored = match self.store.update_job(job_id, &update)? {
            Some(stored) => stored,
            // Someone else moved the job on; only count the attempt.
            None => {
                let attempt_only = JobUpdate {
                    poll_attempts: Some(attempts),
                    ..Default::default()
                };
                match self.store.update_job(job_id, &attempt_only)? {
                    Some(stored) => stored,
                    None => return Ok(false),
                }
            }
        };

        if stored.status.is_terminal() {
            info!("Job {job_id} finished with status {}", stored.status);
            return Ok(false);
        }
        Ok(stored.poll_attempts < self.settings.max_attempts)
    }

    async fn run_monitor(self, job_id: i32, monitor_id: u64) {
        for _ in 0..self.settings.max_attempts {
            match self.poll_once(job_id).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => error!("Failed to update job {job_id} - {err}"),
            }
            sleep(self.settings.poll_interval).await;
        }

        if let Err(err) = self
            .tx
            .send(TrackerEvent::MonitorFinished { job_id, monitor_id })
            .await
        {
            error!("Failed to send MonitorFinished event for job {job_id} - {err}");
        }
    }
}

impl TrackerPrivate {
    fn start_thread(mut self, mut rx: Receiver<TrackerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                debug!(
                    "New Tracker Event {:?}. Running monitors {}",
                    event,
                    self.monitors.len()
                );
                match event {
                    TrackerEvent::Monitor { job_id } => self.handle_monitor(job_id),
                    TrackerEvent::MonitorFinished { job_id, monitor_id } => {
                        self.handle_monitor_finished(job_id, monitor_id)
                    }
                    TrackerEvent::Shutdown => {
                        self.handle_shutdown();
                        break;
                    }
                }
            }
        })
    }

    fn handle_monitor(&mut self, job_id: i32) {
        if let Some(running) = self.monitors.get(&job_id) {
            if !running.handle.is_finished() {
                debug!("Job {job_id} is already being monitored");
                return;
            }
        }

        self.next_monitor_id += 1;
        let monitor_id = self.next_monitor_id;
        let tracker = self.tracker.clone();
        let handle = tokio::spawn(tracker.run_monitor(job_id, monitor_id));
        info!("Monitoring job {job_id}");
        self.monitors
            .insert(job_id, RunningMonitor { monitor_id, handle });
    }

    fn handle_monitor_finished(&mut self, job_id: i32, monitor_id: u64) {
        let current = self
            .monitors
            .get(&job_id)
            .is_some_and(|running| running.monitor_id == monitor_id);
        if current {
            self.monitors.remove(&job_id);
        }
    }

    fn handle_shutdown(&mut self) {
        info!("Stopping {} job monitors", self.monitors.len());
        for (_, running) in self.monitors.drain() {
            running.handle.abort();
        }
    }
}
