//! Background bulk completion.
//!
//! Jobs are queued on an unbounded channel and drained by a single worker
//! task. Enqueueing never waits for the job to run. There is no retry and no
//! cancellation: a queued job runs once, and a failure on one item is logged
//! and skipped while the rest of the batch carries on.

use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{ItemChanges, ItemFilter},
    service::Store,
};

pub const DEFAULT_QUEUE: &str = "default";

/// Marks every item of one list as completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompleteAllJob {
    pub todo_list_id: i64,
}

impl CompleteAllJob {
    pub fn new(todo_list_id: i64) -> Self {
        Self { todo_list_id }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompleteAllReport {
    pub completed: usize,
    pub already_completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct JobQueue {
    name: &'static str,
    sender: mpsc::UnboundedSender<CompleteAllJob>,
}

impl JobQueue {
    /// Creates the `default` queue and spawns its worker on the current runtime.
    pub fn start(store: Store) -> (Self, JoinHandle<()>) {
        let (queue, worker) = Self::new(DEFAULT_QUEUE, store);
        let handle = tokio::spawn(worker.run());
        (queue, handle)
    }

    pub fn new(name: &'static str, store: Store) -> (Self, Worker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = Self { name, sender };
        let worker = Worker {
            queue: name,
            store,
            receiver,
        };
        (queue, worker)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn enqueue(&self, job: CompleteAllJob) -> AppResult<()> {
        self.sender.send(job).map_err(|_| AppError::QueueClosed)?;
        info!(
            queue = self.name,
            todo_list_id = job.todo_list_id,
            "complete-all job enqueued"
        );
        Ok(())
    }
}

pub struct Worker {
    queue: &'static str,
    store: Store,
    receiver: mpsc::UnboundedReceiver<CompleteAllJob>,
}

impl Worker {
    /// Drains the queue until every [`JobQueue`] handle has been dropped.
    pub async fn run(mut self) {
        info!(queue = self.queue, "job worker started");
        while let Some(job) = self.receiver.recv().await {
            info!(
                queue = self.queue,
                todo_list_id = job.todo_list_id,
                "complete-all job started"
            );
            match perform(&self.store, job).await {
                Ok(report) => info!(
                    queue = self.queue,
                    todo_list_id = job.todo_list_id,
                    completed = report.completed,
                    already_completed = report.already_completed,
                    failed = report.failed,
                    "complete-all job finished"
                ),
                Err(err) => warn!(
                    queue = self.queue,
                    todo_list_id = job.todo_list_id,
                    error = %err,
                    "complete-all job aborted"
                ),
            }
        }
        info!(queue = self.queue, "job worker stopped");
    }
}

/// Runs one job inline.
///
/// Each pending item is saved on its own through [`Store::update_item`]
/// rather than with a single bulk statement, so every record fires its
/// update notification.
pub async fn perform(store: &Store, job: CompleteAllJob) -> AppResult<CompleteAllReport> {
    let mut report = CompleteAllReport::default();

    if store.repo().get_todo_list(job.todo_list_id).await?.is_none() {
        warn!(
            todo_list_id = job.todo_list_id,
            "todo list vanished before complete-all ran"
        );
        return Ok(report);
    }

    let items = store
        .repo()
        .list_items(job.todo_list_id, ItemFilter::All)
        .await?;

    for item in items {
        if item.completed {
            report.already_completed += 1;
            continue;
        }

        match store
            .update_item(job.todo_list_id, item.id, ItemChanges::completed(true))
            .await
        {
            Ok(Some(_)) => report.completed += 1,
            // deleted while the batch was running
            Ok(None) => {}
            Err(err) => {
                report.failed += 1;
                warn!(
                    todo_list_id = job.todo_list_id,
                    item_id = item.id,
                    error = %err,
                    "failed to complete item"
                );
            }
        }
    }

    Ok(report)
}
