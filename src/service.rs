use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    jobs::{CompleteAllJob, JobQueue},
    models::{
        Item, ItemChanges, ItemFilter, ItemParams, NewItem, NewTodoList, SortOrder, TodoList,
        TodoListChanges, TodoListParams,
    },
    notify::ItemNotifier,
    repository::TodoRepository,
    validation::{validate_item, validate_todo_list},
};

/// Repository plus the post-commit notification hook.
///
/// Every item update, whether it comes from a request or from the
/// background worker, goes through [`Store::update_item`] so subscribers
/// hear about each record individually.
#[derive(Clone)]
pub struct Store {
    repo: Arc<dyn TodoRepository>,
    notifier: Arc<dyn ItemNotifier>,
}

impl Store {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn ItemNotifier>) -> Self {
        Self { repo, notifier }
    }

    pub fn repo(&self) -> &dyn TodoRepository {
        self.repo.as_ref()
    }

    pub async fn update_item(
        &self,
        todo_list_id: i64,
        id: i64,
        changes: ItemChanges,
    ) -> AppResult<Option<Item>> {
        let updated = self.repo.update_item(todo_list_id, id, changes).await?;
        if let Some(item) = &updated {
            self.notifier.item_updated(item);
        }
        Ok(updated)
    }

    pub async fn toggle_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>> {
        let toggled = self.repo.toggle_item(todo_list_id, id).await?;
        if let Some(item) = &toggled {
            self.notifier.item_updated(item);
        }
        Ok(toggled)
    }
}

/// The operations behind both the JSON API and the HTML interface.
#[derive(Clone)]
pub struct TodoService {
    store: Store,
    jobs: JobQueue,
}

impl TodoService {
    pub fn new(store: Store, jobs: JobQueue) -> Self {
        Self { store, jobs }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    pub async fn list_todo_lists(&self, order: SortOrder) -> AppResult<Vec<TodoList>> {
        self.store.repo().list_todo_lists(order).await
    }

    pub async fn get_todo_list(&self, id: i64) -> AppResult<TodoList> {
        self.store
            .repo()
            .get_todo_list(id)
            .await?
            .ok_or_else(AppError::todo_list_not_found)
    }

    pub async fn create_todo_list(&self, params: TodoListParams) -> AppResult<TodoList> {
        let name = params.name.flatten();
        validate_todo_list(name.as_deref())?;
        let name = name.unwrap_or_default();

        let list = self
            .store
            .repo()
            .create_todo_list(NewTodoList { name })
            .await?;
        info!(todo_list_id = list.id, "todo list created");
        Ok(list)
    }

    pub async fn update_todo_list(&self, id: i64, params: TodoListParams) -> AppResult<TodoList> {
        let current = self.get_todo_list(id).await?;
        let name = match &params.name {
            Some(supplied) => supplied.as_deref(),
            None => Some(current.name.as_str()),
        };
        validate_todo_list(name)?;

        let changes = TodoListChanges {
            name: params.name.flatten(),
        };
        self.store
            .repo()
            .update_todo_list(id, changes)
            .await?
            .ok_or_else(AppError::todo_list_not_found)
    }

    pub async fn delete_todo_list(&self, id: i64) -> AppResult<()> {
        if !self.store.repo().delete_todo_list(id).await? {
            return Err(AppError::todo_list_not_found());
        }
        info!(todo_list_id = id, "todo list deleted");
        Ok(())
    }

    /// Schedules bulk completion and returns without waiting for it.
    pub async fn complete_all(&self, id: i64) -> AppResult<TodoList> {
        let list = self.get_todo_list(id).await?;
        self.jobs.enqueue(CompleteAllJob::new(list.id))?;
        Ok(list)
    }

    pub async fn list_items(&self, todo_list_id: i64, filter: ItemFilter) -> AppResult<Vec<Item>> {
        self.get_todo_list(todo_list_id).await?;
        self.store.repo().list_items(todo_list_id, filter).await
    }

    pub async fn get_item(&self, todo_list_id: i64, id: i64) -> AppResult<Item> {
        self.get_todo_list(todo_list_id).await?;
        self.store
            .repo()
            .get_item(todo_list_id, id)
            .await?
            .ok_or_else(AppError::item_not_found)
    }

    pub async fn create_item(&self, todo_list_id: i64, params: ItemParams) -> AppResult<Item> {
        self.get_todo_list(todo_list_id).await?;
        let title = params.title.flatten();
        validate_item(title.as_deref())?;

        let new = NewItem {
            title: title.unwrap_or_default(),
            description: params.description.flatten(),
            completed: params.completed.unwrap_or(false),
        };
        let item = self.store.repo().create_item(todo_list_id, new).await?;
        debug!(todo_list_id, item_id = item.id, "item created");
        Ok(item)
    }

    /// Fields left out of `params` keep their stored values; a supplied
    /// `null` title fails validation like a blank one.
    pub async fn update_item(
        &self,
        todo_list_id: i64,
        id: i64,
        params: ItemParams,
    ) -> AppResult<Item> {
        let current = self.get_item(todo_list_id, id).await?;
        let title = match &params.title {
            Some(supplied) => supplied.as_deref(),
            None => Some(current.title.as_str()),
        };
        validate_item(title)?;

        self.store
            .update_item(todo_list_id, id, ItemChanges::from(params))
            .await?
            .ok_or_else(AppError::item_not_found)
    }

    pub async fn delete_item(&self, todo_list_id: i64, id: i64) -> AppResult<Item> {
        let item = self.get_item(todo_list_id, id).await?;
        if !self.store.repo().delete_item(todo_list_id, id).await? {
            return Err(AppError::item_not_found());
        }
        debug!(todo_list_id, item_id = id, "item deleted");
        Ok(item)
    }

    /// Stores the negation of the current flag.
    pub async fn toggle_item(&self, todo_list_id: i64, id: i64) -> AppResult<Item> {
        self.get_todo_list(todo_list_id).await?;
        self.store
            .toggle_item(todo_list_id, id)
            .await?
            .ok_or_else(AppError::item_not_found)
    }
}
