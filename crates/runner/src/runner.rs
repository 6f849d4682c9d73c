//! Request orchestration
//!
//! `Runner::run` builds the computation key, then asks the cache for the
//! result. On a miss the cache drives `RunnerInner::execute`, which stages a
//! workspace, runs the tool, collects outputs and releases the workspace.

use crate::collector::collect_outputs;
use crate::executor::{ProcessExecutor, ProcessStatus};
use crate::workspace::{is_plain_file_name, Workspace};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use zeorun_cache::{CacheStatSnapshot, CacheStatus, ComputationCache, ComputationKey};
use zeorun_config::Settings;
use zeorun_core::{Error, ExecutionResult, Result, ToolArguments};

/// A fixed mapping from one analysis to its tool invocation
pub trait OperationDescriptor {
    /// Stable operation identifier, part of the cache key
    fn id(&self) -> &'static str;

    /// Full argument list given the staged input file name
    fn arguments(&self, staged_input: &str) -> ToolArguments;

    /// Output files the tool is expected to write
    fn output_files(&self) -> BTreeSet<String>;

    /// Per-operation timeout override
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Everything needed for one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Structure file content
    pub structure: Bytes,
    /// Name the structure is staged under inside the workspace
    pub input_name: String,
    /// Exact tool arguments, order preserved
    pub arguments: ToolArguments,
    /// Output files to read back
    pub outputs: BTreeSet<String>,
    /// Logical operation identifier
    pub operation_id: String,
    /// Falls back to the runner default when `None`
    pub timeout: Option<Duration>,
}

impl RunRequest {
    /// Build the request for `descriptor` applied to `structure`
    pub fn for_operation<D: OperationDescriptor + ?Sized>(
        descriptor: &D,
        structure: Bytes,
        input_name: impl Into<String>,
    ) -> Self {
        let input_name = input_name.into();
        Self {
            arguments: descriptor.arguments(&input_name),
            outputs: descriptor.output_files(),
            operation_id: descriptor.id().to_string(),
            timeout: descriptor.timeout(),
            structure,
            input_name,
        }
    }

    pub fn key(&self) -> ComputationKey {
        ComputationKey::build(&self.structure, &self.arguments, &self.operation_id)
    }

    fn validate(&self) -> Result<()> {
        if self.operation_id.is_empty() {
            return Err(Error::invalid_input("operation_id", "must not be empty"));
        }
        if !is_plain_file_name(&self.input_name) {
            return Err(Error::invalid_input(
                "input_name",
                format!("'{}' is not a plain file name", self.input_name),
            ));
        }
        if let Some(name) = self.outputs.iter().find(|n| !is_plain_file_name(n)) {
            return Err(Error::invalid_input(
                "outputs",
                format!("'{name}' is not a plain file name"),
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_input("timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Result of `Runner::run`
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub result: Arc<ExecutionResult>,
    pub status: CacheStatus,
}

impl RunResponse {
    pub fn success(&self) -> bool {
        self.result.success()
    }

    /// Whether the result came from the cache or a shared in-flight run
    pub fn cached(&self) -> bool {
        self.status.cached()
    }

    pub fn stderr(&self) -> &str {
        &self.result.stderr
    }

    pub fn outputs(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.result.outputs
    }
}

/// Runner tuning, usually derived from `Settings`
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub workspace_root: PathBuf,
    pub default_timeout: Duration,
    pub max_concurrent_executions: usize,
    pub cache_max_entries: NonZeroUsize,
    pub cache_max_bytes: u64,
}

impl RunnerConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let cache_max_entries = NonZeroUsize::new(settings.cache.max_entries)
            .ok_or_else(|| Error::configuration("cache.max_entries must be greater than zero"))?;
        Ok(Self {
            workspace_root: settings.runner.workspace_root.clone(),
            default_timeout: settings.runner.default_timeout(),
            max_concurrent_executions: settings.runner.max_concurrent_executions,
            cache_max_entries,
            cache_max_bytes: settings.cache.max_bytes,
        })
    }
}

/// Executes tool invocations through the computation cache.
///
/// Cheap to clone; clones share the executor, cache and permits.
pub struct Runner<E: ProcessExecutor> {
    inner: Arc<RunnerInner<E>>,
}

impl<E: ProcessExecutor> Clone for Runner<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct RunnerInner<E> {
    executor: E,
    cache: Arc<ComputationCache>,
    permits: Semaphore,
    workspace_root: PathBuf,
    default_timeout: Duration,
}

impl<E: ProcessExecutor> Runner<E> {
    pub fn new(executor: E, config: RunnerConfig) -> Result<Self> {
        let cache = Arc::new(ComputationCache::new(
            config.cache_max_entries,
            config.cache_max_bytes,
        ));
        Self::with_cache(executor, config, cache)
    }

    /// Build a runner around an existing cache
    pub fn with_cache(
        executor: E,
        config: RunnerConfig,
        cache: Arc<ComputationCache>,
    ) -> Result<Self> {
        if config.max_concurrent_executions == 0 {
            return Err(Error::configuration(
                "max_concurrent_executions must be greater than zero",
            ));
        }
        if config.default_timeout.is_zero() {
            return Err(Error::configuration("default timeout must be greater than zero"));
        }

        tracing::debug!(
            program = %executor.program(),
            workspace_root = %config.workspace_root.display(),
            max_concurrent = config.max_concurrent_executions,
            "runner created"
        );

        Ok(Self {
            inner: Arc::new(RunnerInner {
                executor,
                cache,
                permits: Semaphore::new(config.max_concurrent_executions),
                workspace_root: config.workspace_root,
                default_timeout: config.default_timeout,
            }),
        })
    }

    /// Run one tool invocation, or serve it from the cache.
    ///
    /// Non-zero exits, timeouts and missing outputs come back as an
    /// unsuccessful `ExecutionResult`; `Err` means the request itself was
    /// invalid or the environment failed.
    #[tracing::instrument(skip_all, fields(operation = %request.operation_id))]
    pub async fn run(&self, request: RunRequest) -> Result<RunResponse> {
        request.validate()?;
        let key = request.key();

        let inner = Arc::clone(&self.inner);
        let operation_key = key.clone();
        let lookup = self
            .inner
            .cache
            .get_or_compute(&key, move || inner.execute(operation_key, request))
            .await?;

        match lookup.status {
            CacheStatus::Miss => {}
            status => tracing::debug!(key = %key.short(), ?status, "served without executing"),
        }

        Ok(RunResponse {
            result: lookup.result,
            status: lookup.status,
        })
    }

    /// Run a descriptor-defined operation on `structure`
    pub async fn run_operation<D: OperationDescriptor + ?Sized>(
        &self,
        descriptor: &D,
        structure: Bytes,
        staged_input: &str,
    ) -> Result<RunResponse> {
        self.run(RunRequest::for_operation(descriptor, structure, staged_input))
            .await
    }

    pub fn cache(&self) -> &Arc<ComputationCache> {
        &self.inner.cache
    }

    pub fn cache_stats(&self) -> CacheStatSnapshot {
        self.inner.cache.stats()
    }

    pub fn executor(&self) -> &E {
        &self.inner.executor
    }
}

impl<E: ProcessExecutor> RunnerInner<E> {
    async fn execute(
        self: Arc<Self>,
        key: ComputationKey,
        request: RunRequest,
    ) -> Result<ExecutionResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::configuration("execution permits were closed"))?;

        let workspace = Workspace::stage(
            &self.workspace_root,
            &request.structure,
            &request.input_name,
        )
        .await?;
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        tracing::info!(
            key = %key.short(),
            workspace = %workspace.path().display(),
            args = %request.arguments,
            "executing tool"
        );

        // On any early return the workspace is dropped and removed
        let output = self
            .executor
            .execute(workspace.path(), &request.arguments, timeout)
            .await?;
        let stderr = output.stderr_lossy();

        let result = match output.status {
            ProcessStatus::TimedOut => {
                tracing::warn!(
                    key = %key.short(),
                    timeout_ms = timeout.as_millis() as u64,
                    "tool timed out and was killed"
                );
                ExecutionResult::timed_out(stderr, timeout)
            }
            ProcessStatus::Exited { code } => {
                let collected = collect_outputs(workspace.path(), &request.outputs).await?;
                ExecutionResult::completed(
                    code,
                    stderr,
                    collected.outputs,
                    collected.first_missing,
                    output.duration,
                )
            }
        };
        workspace.close();

        let duration_ms = result.duration.as_millis() as u64;
        match &result.failure {
            None => tracing::info!(
                key = %key.short(),
                exit_code = result.exit_code,
                duration_ms,
                "tool finished"
            ),
            Some(failure) => tracing::warn!(
                key = %key.short(),
                exit_code = result.exit_code,
                duration_ms,
                failure = failure.label(),
                stderr = %result.stderr.trim(),
                "tool run failed"
            ),
        }

        Ok(result)
    }
}
