//! # Detached Command Execution
//!
//! Runs asynchronous commands off the dispatch path. Concurrency is bounded by a
//! semaphore and every task is recorded so failures and panics stay observable.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Finished records beyond the retention count are dropped oldest first
//! - 1.0.0: Bounded detached execution with a task table

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

/// Status of a detached task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Waiting for a free slot
    Queued,
    Running,
    Completed,
    Failed(String),
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed(_))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A detached task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    /// Canonical alias of the command being run
    pub command: String,
    pub status: TaskStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Finished task records kept for inspection
pub const FINISHED_TASK_RETENTION: usize = 64;

/// Bounded pool for fire-and-forget command execution
#[derive(Clone)]
pub struct DetachedExecutor {
    permits: Arc<Semaphore>,
    tasks: Arc<DashMap<Uuid, TaskRecord>>,
    idle: Arc<Notify>,
    retention: usize,
}

impl DetachedExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_retention(max_concurrent, FINISHED_TASK_RETENTION)
    }

    /// Keep at most `retention` finished records; queued and running tasks are
    /// always tracked
    pub fn with_retention(max_concurrent: usize, retention: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tasks: Arc::new(DashMap::new()),
            idle: Arc::new(Notify::new()),
            retention,
        }
    }

    /// Start `work` in the background and return its task id
    ///
    /// The caller is never told when it finishes. Errors and panics are logged
    /// and recorded in the task table.
    pub fn spawn<F>(&self, command: &str, request_id: Uuid, work: F) -> Uuid
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        self.tasks.insert(
            id,
            TaskRecord {
                id,
                request_id,
                command: command.to_string(),
                status: TaskStatus::Queued,
                queued_at: Utc::now(),
                started_at: None,
                finished_at: None,
            },
        );

        info!("[{request_id}] 🚀 Detached task {id} queued for '{command}'");

        let permits = Arc::clone(&self.permits);
        let tasks = Arc::clone(&self.tasks);
        let idle = Arc::clone(&self.idle);
        let retention = self.retention;
        let command = command.to_string();

        tokio::spawn(async move {
            let status = match permits.acquire_owned().await {
                Ok(_permit) => {
                    if let Some(mut record) = tasks.get_mut(&id) {
                        record.status = TaskStatus::Running;
                        record.started_at = Some(Utc::now());
                    }
                    debug!("[{request_id}] ▶️ Detached task {id} started for '{command}'");

                    // Run on its own task so a panic is caught as a JoinError
                    match tokio::spawn(work).await {
                        Ok(Ok(())) => TaskStatus::Completed,
                        Ok(Err(e)) => {
                            error!("[{request_id}] ❌ Detached command '{command}' failed: {e}");
                            TaskStatus::Failed(e.to_string())
                        }
                        Err(e) => {
                            error!("[{request_id}] 💥 Detached command '{command}' panicked: {e}");
                            TaskStatus::Failed(format!("panicked: {e}"))
                        }
                    }
                }
                Err(e) => {
                    error!("[{request_id}] ❌ Detached executor closed before '{command}' ran: {e}");
                    TaskStatus::Failed("executor closed".to_string())
                }
            };

            if let Some(mut record) = tasks.get_mut(&id) {
                record.status = status;
                record.finished_at = Some(Utc::now());
            }
            trim_finished(&tasks, retention);
            idle.notify_waiters();
        });

        id
    }

    pub fn status(&self, id: &Uuid) -> Option<TaskStatus> {
        self.tasks.get(id).map(|record| record.status.clone())
    }

    pub fn record(&self, id: &Uuid) -> Option<TaskRecord> {
        self.tasks.get(id).map(|record| record.clone())
    }

    /// Tasks that are queued or running
    pub fn running(&self) -> usize {
        self.tasks
            .iter()
            .filter(|record| !record.status.is_finished())
            .count()
    }

    /// Records currently held, finished ones included
    pub fn tracked(&self) -> usize {
        self.tasks.len()
    }

    /// Drop records of finished tasks, returning how many were removed
    pub fn prune_finished(&self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, record| !record.status.is_finished());
        before - self.tasks.len()
    }

    /// Wait until no task is queued or running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.running() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Remove the oldest finished records until at most `retention` remain
fn trim_finished(tasks: &DashMap<Uuid, TaskRecord>, retention: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = tasks
        .iter()
        .filter(|record| record.status.is_finished())
        .filter_map(|record| record.finished_at.map(|at| (at, record.id)))
        .collect();
    if finished.len() <= retention {
        return;
    }

    finished.sort();
    let excess = finished.len() - retention;
    for (_, id) in finished.into_iter().take(excess) {
        tasks.remove(&id);
    }
    debug!("🧹 Dropped {excess} finished task record(s)");
}
