use crate::command::CommandSpec;
use nix::sys::signal;
use nix::unistd::Pid;
use std::fs;
use std::future::Future;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// A `/bin/sh` script standing in for ffmpeg. It ignores the relay arguments unless told otherwise.
pub struct FakeTranscoder {
    dir: TempDir,
    path: PathBuf,
}

impl FakeTranscoder {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("ffmpeg");
        let mut script = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o755)
            .open(&path)
            .expect("failed to create fake transcoder");
        write!(script, "#!/bin/sh\n{}\n", body).expect("failed to write fake transcoder");
        script.sync_all().expect("failed to sync fake transcoder");
        drop(script);
        Self { dir, path }
    }

    /// exits as soon as it gets SIGTERM
    pub fn sleeper() -> Self {
        Self::new("exec sleep 30")
    }

    /// ignores SIGTERM, only a kill stops it
    pub fn stubborn() -> Self {
        Self::new("trap '' TERM\nwhile :; do sleep 0.1; done")
    }

    /// dies right away, like ffmpeg given an unreachable source
    pub fn failing() -> Self {
        Self::new("echo 'http://x/a.m3u8: Connection refused' >&2\nexit 1")
    }

    /// writes its arguments to `args`, one per line, then sleeps
    pub fn recorder() -> Self {
        Self::new(
            "dir=$(dirname \"$0\")\nprintf '%s\\n' \"$@\" > \"$dir/args.tmp\"\nmv \"$dir/args.tmp\" \"$dir/args\"\nexec sleep 30",
        )
    }

    pub fn spec(&self, stream_key: &str) -> CommandSpec {
        CommandSpec::build("http://x/a.m3u8", "rtmp://host/live", stream_key)
            .with_program(self.path.to_string_lossy())
    }

    pub fn recorded_args(&self) -> Option<Vec<String>> {
        let recorded = fs::read_to_string(self.dir.path().join("args")).ok()?;
        Some(recorded.lines().map(str::to_string).collect())
    }
}

pub fn pid_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Poll `check` until it yields a value or `timeout` elapses.
pub async fn wait_until<T, F, Fut>(timeout: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
