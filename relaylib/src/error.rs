use std::{io, result};
use thiserror;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A stream is already running. Use /stop to stop it first.")]
    AlreadyRunning,
    #[error("No stream is currently running.")]
    NotRunning,
    #[error("Error starting stream: {0}")]
    LaunchFailed(#[source] io::Error),
    #[error("The relay is shutting down, no new streams are accepted.")]
    ShuttingDown,
    #[error("The relay supervisor is not running.")]
    SupervisorGone,
}

pub type Result<T> = result::Result<T, Error>;
