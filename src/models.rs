use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TodoList {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub todo_list_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodoList {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListChanges {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl ItemChanges {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.completed.is_some()
    }

    /// The record as it would look once these changes are stored.
    pub fn apply_to(&self, item: &Item) -> Item {
        let mut merged = item.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(completed) = self.completed {
            merged.completed = completed;
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl ItemFilter {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Completed => item.completed,
            Self::Pending => !item.completed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTodoListsQuery {
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub status: ItemFilter,
}

/// `{"todo_list": {"name": ...}}`
///
/// The root is kept as a raw object so an empty `{}` can be told apart
/// from one whose fields are present but null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoListBody {
    pub todo_list: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoListParams {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
}

impl TodoListParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(Some(name.into())),
        }
    }
}

/// `{"item": {"title": ..., "description": ..., "completed": ...}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemBody {
    pub item: Option<Map<String, Value>>,
}

/// Item fields as submitted. The outer `Option` is "supplied or not",
/// the inner one carries an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemParams {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl From<ItemParams> for ItemChanges {
    /// A null title becomes no change; callers validate the merged record first.
    fn from(params: ItemParams) -> Self {
        Self {
            title: params.title.flatten(),
            description: params.description,
            completed: params.completed,
        }
    }
}

/// Keeps an explicit `null` apart from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
