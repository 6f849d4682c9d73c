use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use zeorun_core::{Error, Result, ToolArguments};

/// How long to keep reading pipes after the child has gone away
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How the external process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Ran to completion; `code` is `None` when terminated by a signal
    Exited { code: Option<i32> },
    /// Killed after exceeding its time budget
    TimedOut,
}

/// Captured result of one process launch
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ProcessStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Trait for launching the external tool inside a workspace.
///
/// A non-zero exit or a timeout is a normal `ProcessOutput`; `Err` is
/// reserved for failing to launch or wait on the process at all.
#[async_trait]
pub trait ProcessExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        workspace: &Path,
        args: &ToolArguments,
        timeout: Duration,
    ) -> Result<ProcessOutput>;

    /// Program name for logs and errors
    fn program(&self) -> String;
}

/// Production implementation that spawns a real child process
#[derive(Debug, Clone)]
pub struct SystemProcessExecutor {
    program: PathBuf,
}

impl SystemProcessExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn spawn_error(&self, args: &ToolArguments, message: String) -> Error {
        Error::command_execution(self.program(), args.as_slice().to_vec(), message, None)
    }
}

#[async_trait]
impl ProcessExecutor for SystemProcessExecutor {
    async fn execute(
        &self,
        workspace: &Path,
        args: &ToolArguments,
        timeout: Duration,
    ) -> Result<ProcessOutput> {
        let mut cmd = Command::new(&self.program);
        // Arguments go straight to the program; no shell is involved
        cmd.args(args.as_slice())
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down any helpers too
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| self.spawn_error(args, format!("failed to spawn: {e}")))?;

        // The id is gone once the child is reaped, so keep it for the group kill
        let pgid = child.id();
        tracing::debug!(
            program = %self.program.display(),
            pid = pgid,
            args = %args,
            "process started"
        );

        // Read both pipes while waiting so a chatty child cannot fill one and
        // block forever
        let stdout = PipeReader::spawn(child.stdout.take());
        let stderr = PipeReader::spawn(child.stderr.take());

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                // Helpers left in the group would outlive the workspace and
                // hold the pipes open
                kill_group(pgid);
                ProcessStatus::Exited {
                    code: status.code(),
                }
            }
            Ok(Err(e)) => {
                kill_group(pgid);
                return Err(self.spawn_error(args, format!("failed to wait for process: {e}")));
            }
            Err(_) => {
                terminate(&mut child, pgid).await;
                ProcessStatus::TimedOut
            }
        };

        let duration = started.elapsed();
        Ok(ProcessOutput {
            status,
            stdout: stdout.drain(PIPE_DRAIN_GRACE).await,
            stderr: stderr.drain(PIPE_DRAIN_GRACE).await,
            duration,
        })
    }

    fn program(&self) -> String {
        self.program.display().to_string()
    }
}

/// Background reader that appends pipe chunks to a shared buffer
struct PipeReader {
    buf: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeReader {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let task = tokio::spawn(async move {
            if let Some(pipe) = pipe {
                read_pipe(pipe, &sink).await;
            }
        });
        Self { buf, task }
    }

    /// Wait up to `grace` for end of stream. Whatever arrived before that is
    /// returned even if the writer never closes its end.
    async fn drain(mut self, grace: Duration) -> Vec<u8> {
        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "pipe reader task failed"),
            Err(_) => {
                tracing::debug!(?grace, "pipe still open after grace period");
                self.task.abort();
            }
        }
        std::mem::take(&mut *self.buf.lock())
    }
}

async fn read_pipe<R>(mut pipe: R, sink: &Mutex<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
            Err(e) => {
                tracing::debug!(error = %e, "pipe read ended early");
                break;
            }
        }
    }
}

/// SIGKILL every process left in the child's group
fn kill_group(pgid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pgid.and_then(|pid| i32::try_from(pid).ok()) {
            // SAFETY: kill(2) takes plain integers; an empty group only yields ESRCH
            if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
                tracing::debug!(pgid, "killed leftover processes in group");
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;
}

/// Kill the child and its process group, then reap it
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    kill_group(pgid);

    if let Err(e) = child.kill().await {
        tracing::warn!(pid = pgid, error = %e, "failed to kill timed out process");
    }
}

/// Test implementation that writes scripted files into the workspace.
/// This provides deterministic behavior for runner and cache tests
#[cfg(test)]
pub struct ScriptedExecutor {
    files: Vec<(String, Vec<u8>)>,
    exit_code: i32,
    stderr: String,
    delay: Duration,
    times_out: bool,
    spawn_error: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
    workspaces: std::sync::Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            exit_code: 0,
            stderr: String::new(),
            delay: Duration::ZERO,
            times_out: false,
            spawn_error: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            workspaces: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn writes(mut self, name: &str, content: &[u8]) -> Self {
        self.files.push((name.to_string(), content.to_vec()));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn times_out(mut self) -> Self {
        self.times_out = true;
        self
    }

    pub fn fails_to_spawn(mut self, message: &str) -> Self {
        self.spawn_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Every workspace the executor was invoked in
    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.workspaces
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        workspace: &Path,
        args: &ToolArguments,
        timeout: Duration,
    ) -> Result<ProcessOutput> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Ok(mut seen) = self.workspaces.lock() {
            seen.push(workspace.to_path_buf());
        }

        if let Some(message) = &self.spawn_error {
            return Err(Error::command_execution(
                self.program(),
                args.as_slice().to_vec(),
                message.clone(),
                None,
            ));
        }

        tokio::time::sleep(self.delay).await;

        // Partial output is written even when the run times out
        for (name, content) in &self.files {
            tokio::fs::write(workspace.join(name), content).await?;
        }

        let status = if self.times_out {
            ProcessStatus::TimedOut
        } else {
            ProcessStatus::Exited {
                code: Some(self.exit_code),
            }
        };

        Ok(ProcessOutput {
            status,
            stdout: Vec::new(),
            stderr: self.stderr.as_bytes().to_vec(),
            duration: if self.times_out { timeout } else { self.delay },
        })
    }

    fn program(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> ToolArguments {
        ["-c", script].into()
    }

    #[tokio::test]
    async fn test_runs_in_workspace_and_captures_stderr() {
        let dir = TempDir::new().unwrap();
        let executor = SystemProcessExecutor::new("sh");

        let output = executor
            .execute(
                dir.path(),
                &sh("echo out; echo diag >&2; printf 'x' > made.txt"),
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(output.status, ProcessStatus::Exited { code: Some(0) });
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr_lossy(), "diag\n");
        assert_eq!(std::fs::read(dir.path().join("made.txt")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let output = SystemProcessExecutor::new("sh")
            .execute(dir.path(), &sh("echo bad >&2; exit 3"), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.status, ProcessStatus::Exited { code: Some(3) });
        assert_eq!(output.stderr_lossy(), "bad\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();

        let output = SystemProcessExecutor::new("sh")
            .execute(dir.path(), &sh("sleep 30"), Duration::from_millis(200))
            .await
            .unwrap();

        assert_eq!(output.status, ProcessStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_background_helper_does_not_swallow_stderr() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();

        let output = SystemProcessExecutor::new("sh")
            .execute(
                dir.path(),
                &sh("echo diag >&2; sleep 5 & exit 0"),
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(output.status, ProcessStatus::Exited { code: Some(0) });
        assert_eq!(output.stderr_lossy(), "diag\n");
        // The helper was killed with the group instead of holding the pipe
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_drain_keeps_bytes_read_before_grace_expires() {
        use tokio::io::AsyncWriteExt;

        let (mut writer, reader) = tokio::io::duplex(64);
        let pipe = PipeReader::spawn(Some(reader));

        writer.write_all(b"partial diagnostics\n").await.unwrap();
        writer.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Writer stays open, so only the grace period ends the drain
        let bytes = pipe.drain(Duration::from_millis(100)).await;
        assert_eq!(bytes, b"partial diagnostics\n");
        drop(writer);
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let dir = TempDir::new().unwrap();
        let args: ToolArguments = ["$(touch injected)", ";", "rm -rf ."].into();

        let output = SystemProcessExecutor::new("echo")
            .execute(dir.path(), &args, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"$(touch injected) ; rm -rf .\n");
        assert!(!dir.path().join("injected").exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_command_error() {
        let dir = TempDir::new().unwrap();
        let result = SystemProcessExecutor::new("zeorun-definitely-not-installed")
            .execute(dir.path(), &ToolArguments::new(), Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(Error::CommandExecution { .. })));
    }
}
