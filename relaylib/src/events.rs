use crate::types::JobId;
use std::os::unix::process::ExitStatusExt;
use std::{fmt, io, process::ExitStatus, time::Duration};

/// Lifecycle of a registered job. A stopped job is removed from the registry, so there is no `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Running,
    Terminating,
}

/// How a child process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReport {
    Exited { code: i32 },
    Killed { signal: i32 },
    /// waiting on the child failed, its status is lost
    Unknown,
}

impl From<io::Result<ExitStatus>> for ExitReport {
    fn from(status: io::Result<ExitStatus>) -> Self {
        match status {
            Ok(status) => {
                if let Some(code) = status.code() {
                    ExitReport::Exited { code }
                } else if let Some(signal) = status.signal() {
                    ExitReport::Killed { signal }
                } else {
                    ExitReport::Unknown
                }
            }
            Err(_) => ExitReport::Unknown,
        }
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Exited { code } => write!(f, "exited with code {}", code),
            ExitReport::Killed { signal } => write!(f, "killed by signal {}", signal),
            ExitReport::Unknown => write!(f, "exit status unknown"),
        }
    }
}

/// Which path of the termination protocol resolved a stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// the child exited within the grace period after SIGTERM
    Graceful,
    /// the grace period elapsed and the child was killed
    Forced,
}

/// A successfully launched job.
#[derive(Clone, Debug)]
pub struct Started {
    pub job_id: JobId,
    pub pid: Option<u32>,
    pub source: String,
    pub destination: String,
}

impl fmt::Display for Started {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Started streaming from {} to {}.",
            self.source, self.destination
        )
    }
}

/// A job that went through the termination protocol and was removed from the registry.
///
/// Both outcomes are a success for the caller and render the same confirmation.
#[derive(Clone, Copy, Debug)]
pub struct Stopped {
    pub job_id: JobId,
    pub outcome: StopOutcome,
    pub exit: ExitReport,
}

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream stopped.")
    }
}

/// Snapshot of a registered job.
#[derive(Clone, Debug)]
pub struct JobInfo {
    pub job_id: JobId,
    pub pid: Option<u32>,
    pub state: JobState,
    pub source: String,
    pub destination: String,
    pub uptime: Duration,
}

impl fmt::Display for JobInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            JobState::Running => write!(
                f,
                "Streaming from {} to {} for {}s.",
                self.source,
                self.destination,
                self.uptime.as_secs()
            ),
            JobState::Terminating => write!(
                f,
                "Stopping the stream from {} to {}.",
                self.source, self.destination
            ),
        }
    }
}
