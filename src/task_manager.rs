//! Task management for async service lifecycle.

use std::{collections::HashMap, future::Future, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// How long a cancelled task may take to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracks the long-running tasks of the daemon.
///
/// Every task receives a child of one global cancellation token, so a
/// single [`shutdown_all`](TaskManager::shutdown_all) stops them together.
pub struct TaskManager {
    tasks: JoinSet<Result<()>>,
    names: HashMap<Id, &'static str>,
    exited: Vec<(&'static str, Result<()>)>,
    global_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            names: HashMap::new(),
            exited: Vec::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns and registers a task under `name`.
    pub fn spawn_task<F, Fut>(&mut self, name: &'static str, task_fn: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if self.is_running(name) {
            anyhow::bail!("Task '{name}' is already running");
        }

        let token = self.global_token.child_token();
        let handle = self.tasks.spawn(async move {
            info!("Starting task: {name}");
            let result = task_fn(token).await;
            match &result {
                Ok(()) => info!("Task '{name}' completed successfully"),
                Err(e) => error!("Task '{name}' failed: {e:#}"),
            }
            result
        });

        self.names.insert(handle.id(), name);
        Ok(())
    }

    /// Cancels every task and waits for each to finish.
    ///
    /// Returns the first failure, including one from a task that exited
    /// before shutdown, after all tasks have been awaited.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.names.len());
        self.global_token.cancel();

        let mut outcomes: Vec<_> = self
            .exited
            .drain(..)
            .map(|(name, result)| result.with_context(|| format!("Task '{name}' failed")))
            .collect();

        loop {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.tasks.join_next_with_id()).await {
                Ok(Some(joined)) => {
                    let (name, result) = self.take_outcome(joined);
                    outcomes.push(result.with_context(|| format!("Task '{name}' failed")));
                }
                Ok(None) => break,
                Err(_) => {
                    for name in self.names.drain().map(|(_, name)| name) {
                        outcomes.push(Err(anyhow!("Task '{name}' shutdown timeout exceeded")));
                    }
                    self.tasks.abort_all();
                    break;
                }
            }
        }

        let mut first_error = None;
        for e in outcomes.into_iter().filter_map(Result::err) {
            warn!("{e:#}");
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    /// Resolves once any task has exited on its own and returns its name.
    ///
    /// The outcome is kept for [`shutdown_all`](TaskManager::shutdown_all).
    /// Pending forever while no task is registered.
    pub async fn any_finished(&mut self) -> &'static str {
        let Some(joined) = self.tasks.join_next_with_id().await else {
            return std::future::pending().await;
        };
        let (name, result) = self.take_outcome(joined);
        self.exited.push((name, result));
        name
    }

    fn take_outcome(
        &mut self,
        joined: Result<(Id, Result<()>), JoinError>,
    ) -> (&'static str, Result<()>) {
        match joined {
            Ok((id, result)) => (self.names.remove(&id).unwrap_or("unknown"), result),
            Err(e) => {
                let name = self.names.remove(&e.id()).unwrap_or("unknown");
                (name, Err(anyhow!("Task '{name}' panicked: {e}")))
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.names.values().any(|running| *running == name)
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
