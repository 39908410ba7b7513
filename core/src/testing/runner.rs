use std::{io, path::Path, process::Stdio, sync::Arc, time::Duration};

use nix::errno::Errno;
use tokio::{
    process::{Child, Command},
    sync::{oneshot, Mutex},
    task::JoinHandle,
    time::Instant,
};

use super::result::{ExitKind, RunOutcome};
use crate::error::JudgeError;

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    time_limit: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);
    const SPAWN_ATTEMPTS: u32 = 5;
    const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(20);

    pub fn new() -> Self {
        Self {
            time_limit: Self::DEFAULT_TIME_LIMIT,
        }
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn get_time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Runs `executable` once inside `working_dir` while a watchdog races it.
    ///
    /// Whether the run timed out is decided by the outcome register, settled by
    /// the parent in whichever branch wins. Only the parent signals the child,
    /// and only before reaping it.
    pub async fn run_with_timeout(
        &self,
        executable: impl AsRef<Path>,
        working_dir: impl AsRef<Path>,
    ) -> Result<RunOutcome, JudgeError> {
        let executable = executable.as_ref();
        let mut child = self.spawn(executable, working_dir.as_ref()).await?;
        let start_at = Instant::now();

        let register = OutcomeRegister::new();
        let (watchdog, deadline) = TimeoutWatchdog::arm(self.time_limit, register.clone());

        let (phase, wait_res) = tokio::select! {
            res = child.wait() => (register.settle(RunPhase::Exited).await, res),
            Ok(()) = deadline => {
                let phase = register.settle(RunPhase::Killed).await;
                log::info!(
                    "Time limit {:?} exceeded, killing pid {:?}",
                    self.time_limit,
                    child.id()
                );
                child
                    .start_kill()
                    .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
                (phase, child.wait().await)
            }
        };
        let elapsed = start_at.elapsed();
        watchdog.disarm();

        let status = match wait_res {
            Ok(status) => status,
            Err(e) => {
                child
                    .start_kill()
                    .unwrap_or_else(|e| log::warn!("Failed to kill subject program: {:#}", e));
                return Err(JudgeError::Communicate(e));
            }
        };

        let exit = if phase == RunPhase::Killed {
            ExitKind::TimedOut
        } else {
            ExitKind::from_status(status)
        };
        log::debug!("{:?} finished: {} in {:?}", executable, exit, elapsed);
        Ok(RunOutcome { exit, elapsed })
    }

    async fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<Child, JudgeError> {
        let mut attempt = 1;
        loop {
            let res = Command::new(executable)
                .current_dir(working_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .kill_on_drop(true)
                .spawn();
            match res {
                Ok(child) => return Ok(child),
                // The freshly staged copy can still be open for writing in a
                // concurrently forked process.
                Err(e) if is_text_file_busy(&e) && attempt < Self::SPAWN_ATTEMPTS => {
                    log::debug!("{:?} is busy, retrying spawn ({})", executable, attempt);
                    attempt += 1;
                    tokio::time::sleep(Self::SPAWN_RETRY_DELAY).await;
                }
                Err(e) => return Err(JudgeError::Spawn(executable.to_owned(), e)),
            }
        }
    }
}

fn is_text_file_busy(e: &io::Error) -> bool {
    e.raw_os_error() == Some(Errno::ETXTBSY as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Running,
    Exited,
    Killed,
}

/// The one piece of state shared by the waiting parent and the watchdog.
/// It leaves `Running` exactly once.
#[derive(Debug, Clone)]
struct OutcomeRegister(Arc<Mutex<RunPhase>>);

impl OutcomeRegister {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(RunPhase::Running)))
    }

    /// Moves a running register to `to`. Returns the phase in effect afterwards,
    /// which is the earlier decision if there already was one.
    async fn settle(&self, to: RunPhase) -> RunPhase {
        let mut phase = self.0.lock().await;
        if *phase == RunPhase::Running {
            *phase = to;
        }
        *phase
    }
}

struct TimeoutWatchdog {
    handle: JoinHandle<()>,
}

impl TimeoutWatchdog {
    /// The returned receiver fires once `limit` has passed while the register
    /// is still `Running`. A watchdog that finds the run settled, or is
    /// disarmed, drops the sender instead.
    fn arm(limit: Duration, register: OutcomeRegister) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(limit).await;

            let phase = register.0.lock().await;
            if *phase != RunPhase::Running {
                return;
            }
            if tx.send(()).is_err() {
                log::debug!("Deadline passed after the parent stopped waiting");
            }
        });
        (Self { handle }, rx)
    }

    /// Best effort: a watchdog that already fired is left alone.
    fn disarm(self) {
        self.handle.abort();
    }
}
