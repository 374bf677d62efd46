mod actor;
mod messages;
mod output;

pub use messages::ExitNotice;

use crate::command::CommandSpec;
use crate::events::{ExitReport, StopOutcome};
use crate::types::JobId;
use actor::Actor;
use messages::WorkerMessage;
use std::{io, process::Stdio, time::Duration};
use tokio::{
    process,
    sync::{mpsc, oneshot},
};

/// Handle to the actor that exclusively owns one child process.
///
/// Dropping every handle makes the actor kill and reap its child.
pub struct WorkerHandle {
    sender: mpsc::UnboundedSender<WorkerMessage>,
    pid: Option<u32>,
}

impl WorkerHandle {
    /// Launch the child described by `spec` and hand it to a new worker actor.
    ///
    /// The returned receiver resolves once the child has exited and been reaped, whatever the cause.
    pub fn spawn(
        job_id: JobId,
        spec: &CommandSpec,
    ) -> io::Result<(Self, oneshot::Receiver<ExitNotice>)> {
        let child = process::Command::new(spec.program())
            .args(spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let pid = child.id();
        let (sender, inbox) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        Actor::spawn(job_id, inbox, exit_tx, child);
        Ok((Self { sender, pid }, exit_rx))
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the child to exit, escalating to a kill once `grace` has elapsed.
    ///
    /// If the child already exited the receiver resolves right away with its recorded status.
    pub fn terminate(&self, grace: Duration) -> oneshot::Receiver<(StopOutcome, ExitReport)> {
        let (response, rx) = oneshot::channel();
        let _ = self
            .sender
            .send(WorkerMessage::Terminate { grace, response });
        rx
    }
}
