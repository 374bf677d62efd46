mod actors;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

// re-export the supervisor handle as if it is the supervisor itself.
pub use actors::supervisor::SupervisorHandle as Supervisor;
pub use command::CommandSpec;
pub use config::SupervisorConfig;
pub use error::Error;
pub use events::{ExitReport, JobInfo, JobState, Started, StopOutcome, Stopped};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use crate::test_support::{pid_alive, wait_until, FakeTranscoder};

    fn supervisor(stop_timeout: Duration) -> Supervisor {
        Supervisor::spawn(SupervisorConfig {
            stop_timeout,
            ..SupervisorConfig::default()
        })
    }

    #[tokio::test]
    async fn start_stop_cycle() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());

        let started = supervisor
            .start_job("u1", fake.spec("key1"))
            .await
            .expect("start failed");
        assert_eq!(
            started.to_string(),
            "Started streaming from http://x/a.m3u8 to rtmp://host/live/key1."
        );
        assert!(matches!(
            supervisor.start_job("u1", fake.spec("key1")).await,
            Err(Error::AlreadyRunning)
        ));

        let stopped = supervisor.stop_job("u1").await.expect("stop failed");
        assert_eq!(stopped.to_string(), "Stream stopped.");
        assert_eq!(stopped.job_id, started.job_id);
        assert_eq!(supervisor.active_jobs().await.unwrap(), 0);
        assert!(matches!(
            supervisor.job_status("u1").await,
            Err(Error::NotRunning)
        ));
        assert!(matches!(
            supervisor.stop_job("u1").await,
            Err(Error::NotRunning)
        ));
    }

    #[tokio::test]
    async fn stop_without_start() {
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let err = supervisor.stop_job("nobody").await.unwrap_err();
        assert!(matches!(err, Error::NotRunning));
        assert_eq!(err.to_string(), "No stream is currently running.");
    }

    #[tokio::test]
    async fn launch_failure_leaves_no_entry() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let missing = fake.spec("key1").with_program("/nonexistent/bin/ffmpeg");

        let err = supervisor.start_job("u1", missing).await.unwrap_err();
        assert!(matches!(err, Error::LaunchFailed(_)));
        assert!(err.to_string().starts_with("Error starting stream: "));
        assert_eq!(supervisor.active_jobs().await.unwrap(), 0);

        // the user can retry
        supervisor
            .start_job("u1", fake.spec("key1"))
            .await
            .expect("retry failed");
        supervisor.stop_job("u1").await.unwrap();
    }

    #[tokio::test]
    async fn transcoder_receives_args() {
        let fake = FakeTranscoder::recorder();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let spec = fake.spec("key1");
        supervisor.start_job("u1", spec.clone()).await.unwrap();

        let fake = &fake;
        let recorded = wait_until(Duration::from_secs(5), || async move { fake.recorded_args() }).await;
        assert_eq!(recorded.as_deref(), Some(spec.args()));
        supervisor.stop_job("u1").await.unwrap();
    }

    #[tokio::test]
    async fn graceful_stop_does_not_wait_for_timeout() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = supervisor(Duration::from_secs(5));
        let started = supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        let pid = started.pid.expect("no pid");

        let begin = Instant::now();
        let stopped = supervisor.stop_job("u1").await.unwrap();
        assert!(begin.elapsed() < Duration::from_secs(2));
        assert_eq!(stopped.outcome, StopOutcome::Graceful);
        assert_eq!(stopped.exit, ExitReport::Killed { signal: 15 });
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn stubborn_transcoder_is_killed() {
        let fake = FakeTranscoder::stubborn();
        let timeout = Duration::from_secs(1);
        let supervisor = supervisor(timeout);
        let started = supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        let pid = started.pid.expect("no pid");
        // let the script install its trap
        tokio::time::sleep(Duration::from_millis(500)).await;

        let begin = Instant::now();
        let stopped = supervisor.stop_job("u1").await.unwrap();
        let elapsed = begin.elapsed();
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_secs(2));
        assert_eq!(stopped.outcome, StopOutcome::Forced);
        assert_eq!(stopped.exit, ExitReport::Killed { signal: 9 });
        assert_eq!(stopped.to_string(), "Stream stopped.");
        assert!(!pid_alive(pid));
        assert_eq!(supervisor.active_jobs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_starts_for_one_owner() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());

        let attempts = (0..10).map(|_| supervisor.start_job("u1", fake.spec("key1")));
        let results = futures::future::join_all(attempts).await;
        let started = results.iter().filter(|result| result.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|result| matches!(result, Err(Error::AlreadyRunning)))
            .count();
        assert_eq!(started, 1);
        assert_eq!(rejected, 9);
        assert_eq!(supervisor.active_jobs().await.unwrap(), 1);
        supervisor.stop_job("u1").await.unwrap();
    }

    #[tokio::test]
    async fn registry_tracks_many_owners() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let owners: Vec<String> = (0..16).map(|i| format!("user-{}", i)).collect();

        for _cycle in 0..3 {
            for (i, owner) in owners.iter().enumerate() {
                supervisor
                    .start_job(owner.as_str(), fake.spec(&format!("key{}", i)))
                    .await
                    .unwrap();
                assert_eq!(supervisor.active_jobs().await.unwrap(), i + 1);
            }
            let (first, second) = owners.split_at(owners.len() / 2);
            futures::future::join_all(first.iter().map(|owner| supervisor.stop_job(owner.as_str())))
                .await
                .into_iter()
                .for_each(|result| assert!(result.is_ok()));
            assert_eq!(supervisor.active_jobs().await.unwrap(), second.len());
            for owner in second {
                supervisor.stop_job(owner.as_str()).await.unwrap();
            }
            assert_eq!(supervisor.active_jobs().await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn second_stop_sees_not_running() {
        let fake = FakeTranscoder::stubborn();
        let supervisor = supervisor(Duration::from_secs(1));
        supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let (first, second) = tokio::join!(supervisor.stop_job("u1"), supervisor.stop_job("u1"));
        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::NotRunning)));
        assert_eq!(supervisor.active_jobs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn terminating_job_blocks_restart_but_not_other_owners() {
        let stubborn = FakeTranscoder::stubborn();
        let sleeper = FakeTranscoder::sleeper();
        let supervisor = supervisor(Duration::from_secs(2));
        supervisor
            .start_job("u1", stubborn.spec("key1"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let stopping = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.stop_job("u1").await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;

        let begin = Instant::now();
        let status = supervisor.job_status("u1").await.unwrap();
        assert_eq!(status.state, JobState::Terminating);
        assert!(matches!(
            supervisor.start_job("u1", sleeper.spec("key1")).await,
            Err(Error::AlreadyRunning)
        ));
        supervisor
            .start_job("u2", sleeper.spec("key2"))
            .await
            .unwrap();
        assert!(begin.elapsed() < Duration::from_secs(1));

        stopping.await.unwrap().unwrap();
        supervisor
            .start_job("u1", sleeper.spec("key1"))
            .await
            .expect("restart after stop failed");
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn exited_job_is_removed() {
        let fake = FakeTranscoder::failing();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        supervisor.start_job("u1", fake.spec("key1")).await.unwrap();

        let handle = &supervisor;
        let removed = wait_until(Duration::from_secs(5), || async move {
            (handle.active_jobs().await.ok() == Some(0)).then(|| ())
        })
        .await;
        assert!(removed.is_some());

        supervisor
            .start_job("u1", fake.spec("key1"))
            .await
            .expect("start after exit failed");
    }

    #[tokio::test]
    async fn status_describes_running_job() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let started = supervisor.start_job("u1", fake.spec("key1")).await.unwrap();

        let info = supervisor.job_status("u1").await.unwrap();
        assert_eq!(info.job_id, started.job_id);
        assert_eq!(info.pid, started.pid);
        assert_eq!(info.state, JobState::Running);
        assert_eq!(info.source, "http://x/a.m3u8");
        assert_eq!(info.destination, "rtmp://host/live/key1");
        assert!(info
            .to_string()
            .starts_with("Streaming from http://x/a.m3u8 to rtmp://host/live/key1 for "));
        supervisor.stop_job("u1").await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_everything() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let mut pids = vec![];
        for owner in ["a", "b", "c"] {
            let started = supervisor.start_job(owner, fake.spec(owner)).await.unwrap();
            pids.push(started.pid.expect("no pid"));
        }

        supervisor.shutdown().await.unwrap();
        assert_eq!(supervisor.active_jobs().await.unwrap(), 0);
        assert!(pids.iter().all(|pid| !pid_alive(*pid)));
        assert!(matches!(
            supervisor.start_job("a", fake.spec("a")).await,
            Err(Error::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn noisy_transcoder_is_not_blocked() {
        // more than any pipe buffer holds, on both streams, then a clean exit
        let fake = FakeTranscoder::new(
            "line='frame=  100 fps= 25 q=-1.0 size=    512kB time=00:00:04.00 bitrate=1048.6kbits/s'\n\
             yes \"$line\" | head -c 8388608\n\
             yes \"$line\" | head -c 8388608 >&2\n\
             exit 0",
        );
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let started = supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        let pid = started.pid.expect("no pid");

        let handle = &supervisor;
        let removed = wait_until(Duration::from_secs(10), || async move {
            (handle.active_jobs().await.ok() == Some(0)).then(|| ())
        })
        .await;
        assert!(removed.is_some(), "transcoder stalled on a full pipe");
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn zero_message_capacity_still_works() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig {
            message_capacity: 0,
            ..SupervisorConfig::default()
        });
        supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        assert_eq!(supervisor.active_jobs().await.unwrap(), 1);
        supervisor.stop_job("u1").await.unwrap();
    }

    #[tokio::test]
    async fn dropping_the_supervisor_kills_children() {
        let fake = FakeTranscoder::sleeper();
        let supervisor = Supervisor::spawn(SupervisorConfig::default());
        let started = supervisor.start_job("u1", fake.spec("key1")).await.unwrap();
        let pid = started.pid.expect("no pid");
        drop(supervisor);

        let gone = wait_until(Duration::from_secs(5), || async move {
            (!pid_alive(pid)).then(|| ())
        })
        .await;
        assert!(gone.is_some());
    }
}
