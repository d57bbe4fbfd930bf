use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    error::AppResult,
    jobs::JobQueue,
    notify::ItemNotifier,
    repository::TodoRepository,
    service::{Store, TodoService},
    views::Views,
};

#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
    pub views: Views,
}

impl AppState {
    pub fn new(service: TodoService, views: Views) -> Self {
        Self { service, views }
    }

    /// Wires the repository and notifier together and spawns the job worker.
    ///
    /// The worker exits after every clone of the returned state is dropped
    /// and the queue has drained.
    pub fn start(
        repo: Arc<dyn TodoRepository>,
        notifier: Arc<dyn ItemNotifier>,
    ) -> AppResult<(Self, JoinHandle<()>)> {
        let store = Store::new(repo, notifier);
        let (jobs, worker) = JobQueue::start(store.clone());
        let state = Self::new(TodoService::new(store, jobs), Views::new()?);
        Ok((state, worker))
    }
}
