mod actor;
mod messages;

use self::{
    actor::Supervisor,
    messages::SupervisorMessage::{self, CountJobs, GetStatus, Shutdown, StartJob, StopJob},
};
use crate::command::CommandSpec;
use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::events::{JobInfo, Started, Stopped};
use crate::types::OwnerId;
use tokio::sync::{mpsc, oneshot};

/// A `Supervisor` which runs at most one transcoding job per owner and stops jobs on request.
///
/// This struct is actually an actor handle, the real work is done in the actor spawned by `SupervisorHandle::spawn`.
/// The actor is the only owner of the registry, so every check-and-insert or lookup-and-remove happens
/// as one step. Stopping a job never holds up the registry: the bounded wait runs in that job's own worker.
/// The handle can be cloned freely, the actor exits once every clone is dropped and takes the children with it.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
}

impl SupervisorHandle {
    /// Spawn a new supervisor on the current tokio runtime.
    pub fn spawn(config: SupervisorConfig) -> Self {
        // tokio rejects a zero-capacity channel
        let (sender, receiver) = mpsc::channel(config.message_capacity.max(1));
        Supervisor::spawn(receiver, config);
        Self { sender }
    }

    /// Launch `spec` on behalf of `owner`.
    ///
    /// Fails with [`Error::AlreadyRunning`] if the owner already has a job, including one that is being
    /// stopped, and with [`Error::LaunchFailed`] if the process could not be created.
    pub async fn start_job(&self, owner: impl Into<OwnerId>, spec: CommandSpec) -> Result<Started> {
        let owner = owner.into();
        self.request(|response| StartJob {
            owner,
            spec,
            response,
        })
        .await?
    }

    /// Stop the owner's job: SIGTERM, wait for the configured timeout, then kill.
    ///
    /// Resolves once the process is reaped and the job is gone from the registry. A second stop racing
    /// the first gets [`Error::NotRunning`].
    pub async fn stop_job(&self, owner: impl Into<OwnerId>) -> Result<Stopped> {
        let owner = owner.into();
        self.request(|response| StopJob { owner, response }).await?
    }

    pub async fn job_status(&self, owner: impl Into<OwnerId>) -> Result<JobInfo> {
        let owner = owner.into();
        self.request(|response| GetStatus { owner, response })
            .await?
    }

    /// Number of owners with a running or terminating job.
    pub async fn active_jobs(&self) -> Result<usize> {
        self.request(|response| CountJobs { response }).await
    }

    /// Stop every job and refuse new ones. Resolves once the registry is empty.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| Shutdown { response }).await
    }

    async fn request<T>(
        &self,
        msg: impl FnOnce(oneshot::Sender<T>) -> SupervisorMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(msg(tx))
            .await
            .map_err(|_| Error::SupervisorGone)?;
        rx.await.map_err(|_| Error::SupervisorGone)
    }
}
