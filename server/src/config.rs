use clap::Parser;
use relaylib::SupervisorConfig;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Relay M3U8 streams to RTMP endpoints, one stream per user, over gRPC
#[derive(Debug, Parser)]
pub struct ServerConfig {
    /// Address to listen on
    #[clap(long, env = "RELAY_ADDR", default_value = "127.0.0.1:50051")]
    pub addr: SocketAddr,

    /// Transcoder executable, looked up in PATH unless it is a path
    #[clap(long, env = "RELAY_TRANSCODER", default_value = "ffmpeg")]
    pub transcoder: String,

    /// Seconds a stopped transcoder gets to exit after SIGTERM before it is killed
    #[clap(long, env = "RELAY_STOP_TIMEOUT_SECS", default_value = "5")]
    pub stop_timeout_secs: u64,

    /// Capacity of the supervisor's request queue, at least 1
    #[clap(long, env = "RELAY_CHANNEL_CAPACITY", default_value = "32")]
    pub channel_capacity: NonZeroUsize,
}

impl ServerConfig {
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            stop_timeout: Duration::from_secs(self.stop_timeout_secs),
            message_capacity: self.channel_capacity.get(),
        }
    }
}
