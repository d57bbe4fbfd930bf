use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        Item, ItemChanges, ItemFilter, NewItem, NewTodoList, SortOrder, TodoList, TodoListChanges,
    },
    repository::TodoRepository,
    validation::missing_todo_list,
};

#[derive(Debug, Default)]
struct Tables {
    todo_lists: BTreeMap<i64, TodoList>,
    items: BTreeMap<i64, Item>,
    last_todo_list_id: i64,
    last_item_id: i64,
}

/// Ephemeral storage used for development and tests.
///
/// Both tables sit behind one lock, so the foreign-key check on insert and
/// the cascade on delete see a consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for InMemoryRepository {
    async fn init(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list_todo_lists(&self, order: SortOrder) -> AppResult<Vec<TodoList>> {
        let mut lists = self
            .tables
            .read()
            .await
            .todo_lists
            .values()
            .cloned()
            .collect::<Vec<_>>();

        lists.sort_by(|a, b| {
            let ordering = a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        Ok(lists)
    }

    async fn get_todo_list(&self, id: i64) -> AppResult<Option<TodoList>> {
        Ok(self.tables.read().await.todo_lists.get(&id).cloned())
    }

    async fn create_todo_list(&self, new: NewTodoList) -> AppResult<TodoList> {
        let mut tables = self.tables.write().await;
        tables.last_todo_list_id += 1;

        let now = Utc::now();
        let list = TodoList {
            id: tables.last_todo_list_id,
            name: new.name,
            created_at: now,
            updated_at: now,
        };
        tables.todo_lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn update_todo_list(
        &self,
        id: i64,
        changes: TodoListChanges,
    ) -> AppResult<Option<TodoList>> {
        let mut tables = self.tables.write().await;
        let Some(list) = tables.todo_lists.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            list.name = name;
        }
        list.updated_at = Utc::now();
        Ok(Some(list.clone()))
    }

    async fn delete_todo_list(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.todo_lists.remove(&id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, item| item.todo_list_id != id);
        Ok(true)
    }

    async fn list_items(&self, todo_list_id: i64, filter: ItemFilter) -> AppResult<Vec<Item>> {
        let items = self
            .tables
            .read()
            .await
            .items
            .values()
            .filter(|item| item.todo_list_id == todo_list_id && filter.matches(item))
            .cloned()
            .collect();
        Ok(items)
    }

    async fn get_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>> {
        let item = self
            .tables
            .read()
            .await
            .items
            .get(&id)
            .filter(|item| item.todo_list_id == todo_list_id)
            .cloned();
        Ok(item)
    }

    async fn create_item(&self, todo_list_id: i64, new: NewItem) -> AppResult<Item> {
        let mut tables = self.tables.write().await;
        if !tables.todo_lists.contains_key(&todo_list_id) {
            return Err(AppError::Validation(missing_todo_list()));
        }
        tables.last_item_id += 1;

        let now = Utc::now();
        let item = Item {
            id: tables.last_item_id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            todo_list_id,
            created_at: now,
            updated_at: now,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        todo_list_id: i64,
        id: i64,
        changes: ItemChanges,
    ) -> AppResult<Option<Item>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .items
            .get_mut(&id)
            .filter(|item| item.todo_list_id == todo_list_id)
        else {
            return Ok(None);
        };

        *item = changes.apply_to(item);
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn toggle_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .items
            .get_mut(&id)
            .filter(|item| item.todo_list_id == todo_list_id)
        else {
            return Ok(None);
        };

        item.completed = !item.completed;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, todo_list_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .items
            .get(&id)
            .is_some_and(|item| item.todo_list_id == todo_list_id);
        if owned {
            tables.items.remove(&id);
        }
        Ok(owned)
    }

    async fn count_items(&self) -> AppResult<u64> {
        Ok(self.tables.read().await.items.len() as u64)
    }
}
