use super::messages::SupervisorMessage;
use crate::actors::worker::{ExitNotice, WorkerHandle};
use crate::command::CommandSpec;
use crate::config::SupervisorConfig;
use crate::error::{self, Error};
use crate::events::{ExitReport, JobInfo, JobState, Started, StopOutcome, Stopped};
use crate::types::{JobId, OwnerId};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{hash_map::Entry, HashMap};
use std::time::Instant;
use tokio::{
    select,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, warn};

type StopResponse = oneshot::Sender<error::Result<Stopped>>;

/// A registry entry, present while the job is `Running` or `Terminating`.
struct Job {
    job_id: JobId,
    worker: WorkerHandle,
    state: JobState,
    source: String,
    destination: String,
    started_at: Instant,
}

/// Completions the actor waits on next to its inbox.
enum Event {
    /// the child exited, for whatever reason
    Exited {
        owner: OwnerId,
        job_id: JobId,
        notice: Option<ExitNotice>,
    },
    /// the termination protocol for a job resolved
    Stopped {
        owner: OwnerId,
        job_id: JobId,
        result: Option<(StopOutcome, ExitReport)>,
        response: Option<StopResponse>,
    },
}

pub struct Supervisor {
    inbox: mpsc::Receiver<SupervisorMessage>,
    config: SupervisorConfig,
    jobs: HashMap<OwnerId, Job>,
    pending: FuturesUnordered<BoxFuture<'static, Event>>,
    closing: bool,
    shutdown_waiters: Vec<oneshot::Sender<()>>,
}

impl Supervisor {
    pub fn spawn(inbox: mpsc::Receiver<SupervisorMessage>, config: SupervisorConfig) {
        let actor = Self {
            inbox,
            config,
            jobs: HashMap::new(),
            pending: FuturesUnordered::new(),
            closing: false,
            shutdown_waiters: Vec::new(),
        };
        tokio::spawn(async move { actor.run().await });
    }

    async fn run(mut self) {
        use self::SupervisorMessage::*;
        loop {
            select! {
                maybe_msg = self.inbox.recv() => {
                    let msg = match maybe_msg {
                        Some(msg) => msg,
                        // every handle is gone, dropping the registry kills the remaining children
                        None => break,
                    };
                    match msg {
                        StartJob { owner, spec, response } => {
                            let _ = response.send(self.start_job(owner, spec));
                        }
                        StopJob { owner, response } => {
                            self.stop_job(owner, response);
                        }
                        GetStatus { owner, response } => {
                            let _ = response.send(self.get_job_status(&owner));
                        }
                        CountJobs { response } => {
                            let _ = response.send(self.jobs.len());
                        }
                        Shutdown { response } => {
                            self.shutdown(response);
                        }
                    }
                }
                Some(event) = self.pending.next() => {
                    self.handle_event(event);
                }
            }
        }
        debug!(jobs = self.jobs.len(), "supervisor exiting");
    }

    fn start_job(&mut self, owner: OwnerId, spec: CommandSpec) -> error::Result<Started> {
        if self.closing {
            return Err(Error::ShuttingDown);
        }
        // check and insert in one step, a second start for this owner sees the entry
        let slot = match self.jobs.entry(owner) {
            Entry::Occupied(_) => return Err(Error::AlreadyRunning),
            Entry::Vacant(slot) => slot,
        };

        let job_id = uuid::Uuid::new_v4();
        let (worker, exit_rx) = WorkerHandle::spawn(job_id, &spec).map_err(|err| {
            warn!(owner = %slot.key(), program = spec.program(), %err, "failed to launch transcoder");
            Error::LaunchFailed(err)
        })?;
        let pid = worker.pid();
        info!(
            owner = %slot.key(),
            %job_id,
            pid = ?pid,
            source = spec.source(),
            destination = spec.destination(),
            "started transcoder"
        );

        let owner = slot.key().clone();
        self.pending.push(
            async move {
                Event::Exited {
                    owner,
                    job_id,
                    notice: exit_rx.await.ok(),
                }
            }
            .boxed(),
        );
        slot.insert(Job {
            job_id,
            worker,
            state: JobState::Running,
            source: spec.source().to_string(),
            destination: spec.destination().to_string(),
            started_at: Instant::now(),
        });

        Ok(Started {
            job_id,
            pid,
            source: spec.source().to_string(),
            destination: spec.destination().to_string(),
        })
    }

    fn stop_job(&mut self, owner: OwnerId, response: StopResponse) {
        // a job that is already terminating belongs to the stop that got there first
        match self.jobs.get(&owner) {
            Some(job) if job.state == JobState::Running => self.begin_stop(owner, Some(response)),
            _ => {
                let _ = response.send(Err(Error::NotRunning));
            }
        }
    }

    /// Mark the job terminating and hand the bounded wait to its worker, so the registry stays available.
    fn begin_stop(&mut self, owner: OwnerId, response: Option<StopResponse>) {
        if let Some(job) = self.jobs.get_mut(&owner) {
            job.state = JobState::Terminating;
            let job_id = job.job_id;
            info!(%owner, %job_id, "stopping transcoder");
            let done = job.worker.terminate(self.config.stop_timeout);
            self.pending.push(
                async move {
                    Event::Stopped {
                        owner,
                        job_id,
                        result: done.await.ok(),
                        response,
                    }
                }
                .boxed(),
            );
        }
    }

    fn get_job_status(&self, owner: &OwnerId) -> error::Result<JobInfo> {
        self.jobs
            .get(owner)
            .map(|job| JobInfo {
                job_id: job.job_id,
                pid: job.worker.pid(),
                state: job.state,
                source: job.source.clone(),
                destination: job.destination.clone(),
                uptime: job.started_at.elapsed(),
            })
            .ok_or(Error::NotRunning)
    }

    fn shutdown(&mut self, response: oneshot::Sender<()>) {
        self.closing = true;
        let running: Vec<OwnerId> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.state == JobState::Running)
            .map(|(owner, _)| owner.clone())
            .collect();
        info!(jobs = running.len(), "stopping all transcoders");
        for owner in running {
            self.begin_stop(owner, None);
        }
        self.shutdown_waiters.push(response);
        self.notify_if_drained();
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Exited {
                owner,
                job_id,
                notice,
            } => {
                // a terminating job is removed once its stop resolves
                let unexpected = matches!(
                    self.jobs.get(&owner),
                    Some(job) if job.job_id == job_id && job.state == JobState::Running
                );
                if !unexpected {
                    return;
                }
                self.jobs.remove(&owner);
                match notice {
                    Some(ExitNotice {
                        report,
                        stderr_tail,
                    }) => warn!(
                        %owner,
                        %job_id,
                        %report,
                        stderr = ?stderr_tail,
                        "transcoder exited on its own, job removed"
                    ),
                    None => warn!(%owner, %job_id, "transcoder worker vanished, job removed"),
                }
                self.notify_if_drained();
            }
            Event::Stopped {
                owner,
                job_id,
                result,
                response,
            } => {
                if self.jobs.get(&owner).map(|job| job.job_id) == Some(job_id) {
                    self.jobs.remove(&owner);
                }
                let (outcome, exit) = result.unwrap_or_else(|| {
                    warn!(%owner, %job_id, "transcoder worker vanished during stop");
                    (StopOutcome::Forced, ExitReport::Unknown)
                });
                info!(%owner, %job_id, ?outcome, %exit, "transcoder stopped");
                if let Some(response) = response {
                    let _ = response.send(Ok(Stopped {
                        job_id,
                        outcome,
                        exit,
                    }));
                }
                self.notify_if_drained();
            }
        }
    }

    fn notify_if_drained(&mut self) {
        if self.jobs.is_empty() {
            for waiter in self.shutdown_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}
