use crate::command::CommandSpec;
use crate::error;
use crate::events::{JobInfo, Started, Stopped};
use crate::types::OwnerId;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum SupervisorMessage {
    StartJob {
        owner: OwnerId,
        spec: CommandSpec,
        response: oneshot::Sender<error::Result<Started>>,
    },
    StopJob {
        owner: OwnerId,
        response: oneshot::Sender<error::Result<Stopped>>,
    },
    GetStatus {
        owner: OwnerId,
        response: oneshot::Sender<error::Result<JobInfo>>,
    },
    CountJobs {
        response: oneshot::Sender<usize>,
    },
    Shutdown {
        response: oneshot::Sender<()>,
    },
}
