use crate::events::{ExitReport, StopOutcome};
use std::time::Duration;
use tokio::sync::oneshot;

pub enum WorkerMessage {
    Terminate {
        grace: Duration,
        response: oneshot::Sender<(StopOutcome, ExitReport)>,
    },
}

/// Sent exactly once per worker, when its child exits for any reason.
#[derive(Debug)]
pub struct ExitNotice {
    pub report: ExitReport,
    pub stderr_tail: Vec<String>,
}
