use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        Item, ItemChanges, ItemFilter, NewItem, NewTodoList, SortOrder, TodoList, TodoListChanges,
    },
    repository::TodoRepository,
    validation::missing_todo_list,
};

const FOREIGN_KEY_VIOLATION: &str = "23503";

const TODO_LIST_COLUMNS: &str = "id, name, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, title, description, completed, todo_list_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TodoRepository for PgRepository {
    async fn init(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn list_todo_lists(&self, order: SortOrder) -> AppResult<Vec<TodoList>> {
        let direction = sort_order(order);
        let lists = sqlx::query_as::<_, TodoList>(&format!(
            "SELECT {TODO_LIST_COLUMNS} FROM todo_lists ORDER BY created_at {direction}, id {direction}"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn get_todo_list(&self, id: i64) -> AppResult<Option<TodoList>> {
        let list = sqlx::query_as::<_, TodoList>(&format!(
            "SELECT {TODO_LIST_COLUMNS} FROM todo_lists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn create_todo_list(&self, new: NewTodoList) -> AppResult<TodoList> {
        let list = sqlx::query_as::<_, TodoList>(&format!(
            "INSERT INTO todo_lists (name) VALUES ($1) RETURNING {TODO_LIST_COLUMNS}"
        ))
        .bind(new.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    async fn update_todo_list(
        &self,
        id: i64,
        changes: TodoListChanges,
    ) -> AppResult<Option<TodoList>> {
        let list = sqlx::query_as::<_, TodoList>(&format!(
            r#"
            UPDATE todo_lists
            SET name = COALESCE($2, name), updated_at = NOW()
            WHERE id = $1
            RETURNING {TODO_LIST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn delete_todo_list(&self, id: i64) -> AppResult<bool> {
        // items go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, todo_list_id: i64, filter: ItemFilter) -> AppResult<Vec<Item>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE todo_list_id = "
        ));
        builder.push_bind(todo_list_id);
        match filter {
            ItemFilter::All => {}
            ItemFilter::Completed => {
                builder.push(" AND completed = TRUE");
            }
            ItemFilter::Pending => {
                builder.push(" AND completed = FALSE");
            }
        }
        builder.push(" ORDER BY id ASC");

        let items = builder.build_query_as::<Item>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    async fn get_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND todo_list_id = $2"
        ))
        .bind(id)
        .bind(todo_list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn create_item(&self, todo_list_id: i64, new: NewItem) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (title, description, completed, todo_list_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(new.title)
        .bind(new.description)
        .bind(new.completed)
        .bind(todo_list_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_foreign_key_violation)
    }

    async fn update_item(
        &self,
        todo_list_id: i64,
        id: i64,
        changes: ItemChanges,
    ) -> AppResult<Option<Item>> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE items SET updated_at = NOW()");

        if let Some(title) = changes.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(completed) = changes.completed {
            builder.push(", completed = ").push_bind(completed);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND todo_list_id = ")
            .push_bind(todo_list_id)
            .push(" RETURNING ")
            .push(ITEM_COLUMNS);

        let item = builder
            .build_query_as::<Item>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn toggle_item(&self, todo_list_id: i64, id: i64) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET completed = NOT completed, updated_at = NOW()
            WHERE id = $1 AND todo_list_id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(todo_list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_item(&self, todo_list_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND todo_list_id = $2")
            .bind(id)
            .bind(todo_list_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_items(&self) -> AppResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn sort_order(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn map_foreign_key_violation(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            AppError::Validation(missing_todo_list())
        }
        _ => AppError::Database(err),
    }
}
