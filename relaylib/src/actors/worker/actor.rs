use super::messages::{ExitNotice, WorkerMessage};
use super::output::{self, StderrTail};
use crate::events::{ExitReport, StopOutcome};
use crate::types::JobId;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{
    process::Child,
    select,
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time,
};
use tracing::{debug, warn};

// how long an exited child's stderr may take to hit EOF before its tail is reported
const STDERR_FLUSH: Duration = Duration::from_millis(500);

pub struct Actor {
    job_id: JobId,
    inbox: mpsc::UnboundedReceiver<WorkerMessage>,
    exit_tx: Option<oneshot::Sender<ExitNotice>>,
    exit: Option<ExitReport>,
    stderr_tail: Arc<Mutex<StderrTail>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl Actor {
    pub fn spawn(
        job_id: JobId,
        inbox: mpsc::UnboundedReceiver<WorkerMessage>,
        exit_tx: oneshot::Sender<ExitNotice>,
        child: Child,
    ) {
        let actor = Self {
            job_id,
            inbox,
            exit_tx: Some(exit_tx),
            exit: None,
            stderr_tail: Arc::new(Mutex::new(StderrTail::default())),
            stderr_task: None,
        };
        tokio::spawn(async move { actor.run(child).await });
    }

    async fn run(mut self, mut child: Child) {
        // the pipes must be read for as long as the child lives, or it blocks on a full buffer
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(output::drain(stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            self.stderr_task = Some(tokio::spawn(output::collect_stderr(
                self.job_id,
                stderr,
                self.stderr_tail.clone(),
            )));
        }

        loop {
            select! {
                // reap the child as soon as it exits on its own
                status = child.wait(), if self.exit.is_none() => {
                    self.record_exit(status.into()).await;
                }
                maybe_msg = self.inbox.recv() => {
                    match maybe_msg {
                        Some(WorkerMessage::Terminate { grace, response }) => {
                            let result = match self.exit {
                                Some(report) => (StopOutcome::Graceful, report),
                                None => {
                                    let (outcome, report) = self.terminate(&mut child, grace).await;
                                    self.record_exit(report).await;
                                    (outcome, report)
                                }
                            };
                            let _ = response.send(result);
                        }
                        None => {
                            // handle dropped, make sure the child does not outlive us
                            if self.exit.is_none() {
                                if let Err(err) = child.kill().await {
                                    warn!(job_id = %self.job_id, %err, "failed to kill orphaned transcoder");
                                }
                            }
                            return;
                        }
                    }
                }
            }
        }
    }

    /// SIGTERM, wait up to `grace`, then SIGKILL. The child is reaped on both paths.
    async fn terminate(&self, child: &mut Child, grace: Duration) -> (StopOutcome, ExitReport) {
        if let Some(pid) = child.id() {
            debug!(job_id = %self.job_id, pid, "sending SIGTERM");
            if let Err(err) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!(job_id = %self.job_id, pid, %err, "failed to send SIGTERM");
            }
        }

        match time::timeout(grace, child.wait()).await {
            Ok(status) => (StopOutcome::Graceful, status.into()),
            Err(_) => {
                warn!(
                    job_id = %self.job_id,
                    grace_ms = grace.as_millis() as u64,
                    "transcoder still running after SIGTERM, killing it"
                );
                if let Err(err) = child.kill().await {
                    warn!(job_id = %self.job_id, %err, "failed to kill transcoder");
                }
                (StopOutcome::Forced, child.wait().await.into())
            }
        }
    }

    async fn record_exit(&mut self, report: ExitReport) {
        debug!(job_id = %self.job_id, %report, "transcoder exited");
        self.exit = Some(report);
        // let the last stderr lines land in the tail, a grandchild may still hold the pipe open
        if let Some(stderr_task) = self.stderr_task.take() {
            let _ = time::timeout(STDERR_FLUSH, stderr_task).await;
        }
        if let Some(exit_tx) = self.exit_tx.take() {
            let stderr_tail = self
                .stderr_tail
                .lock()
                .map(|tail| tail.lines())
                .unwrap_or_default();
            let _ = exit_tx.send(ExitNotice {
                report,
                stderr_tail,
            });
        }
    }
}
