use std::time::Duration;

/// Tuning for a [`Supervisor`](crate::Supervisor).
#[derive(Clone, Copy, Debug)]
pub struct SupervisorConfig {
    /// How long a stopped transcoder may take to exit after SIGTERM before it is killed.
    pub stop_timeout: Duration,
    /// Capacity of the supervisor's message queue. This limits the build-up of inbound requests.
    /// Zero is treated as one.
    pub message_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
            message_capacity: 32,
        }
    }
}
