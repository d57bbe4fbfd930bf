pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        Item, ItemChanges, ItemFilter, NewItem, NewTodoList, SortOrder, TodoList, TodoListChanges,
    },
};

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

/// Persistence for lists and the items they own.
///
/// Implementations enforce the storage-level invariants: an item can only be
/// inserted under an existing list, and deleting a list deletes its items.
/// Item lookups are always scoped by list so a mismatched pair reads as absent.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn init(&self) -> AppResult<()>;

    async fn list_todo_lists(&self, order: SortOrder) -> AppResult<Vec<TodoList>>;
    async fn get_todo_list(&self, id: i64) -> AppResult<Option<TodoList>>;
    async fn create_todo_list(&self, new: NewTodoList) -> AppResult<TodoList>;
    async fn update_todo_list(
        &self,
        id: i64,
        changes: TodoListChanges,
    ) -> AppResult<Option<TodoList>>;
    async fn delete_todo_list(&self, id: i64) -> AppResult<bool>;

    async fn list_items(&self, todo_list_id: i64, filter: ItemFilter) -> AppResult<Vec<Item>>;
    async fn get_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>>;
    async fn create_item(&self, todo_list_id: i64, new: NewItem) -> AppResult<Item>;
    async fn update_item(
        &self,
        todo_list_id: i64,
        id: i64,
        changes: ItemChanges,
    ) -> AppResult<Option<Item>>;
    /// Negates `completed` in a single write.
    async fn toggle_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>>;
    async fn delete_item(&self, todo_list_id: i64, id: i64) -> AppResult<bool>;

    async fn count_items(&self) -> AppResult<u64>;
}
