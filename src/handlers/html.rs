use axum::{
    Form,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    error::{AppError, HtmlError},
    models::{ItemFilter, ItemParams, SortOrder, TodoListParams},
    state::AppState,
    views::{ItemForm, TodoListForm, TurboStream},
};

type HtmlResult<T> = Result<T, HtmlError>;

const APP_SCRIPT: &str = include_str!("../../assets/app.js");

#[derive(Debug, Default, Deserialize)]
pub struct TodoListFormData {
    pub name: Option<String>,
}

impl TodoListFormData {
    fn params(&self) -> TodoListParams {
        TodoListParams {
            name: self.name.clone().map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemFormData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<String>,
}

impl ItemFormData {
    fn params(&self) -> ItemParams {
        ItemParams {
            title: self.title.clone().map(Some),
            description: self.description(),
            completed: self.completed(),
        }
    }

    fn description(&self) -> Option<Option<String>> {
        self.description
            .as_ref()
            .map(|description| Some(description.clone()).filter(|d| !d.trim().is_empty()))
    }

    fn completed(&self) -> Option<bool> {
        self.completed.as_deref().map(checkbox_checked)
    }

    fn form(&self, action: String, errors: Vec<String>) -> ItemForm {
        ItemForm {
            action,
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            errors,
        }
    }
}

fn checkbox_checked(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on")
}

fn unprocessable(stream: TurboStream) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, stream).into_response()
}

/// Client script that sends the interactive buttons and forms and applies
/// the returned streams.
pub async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_SCRIPT,
    )
}

pub async fn index(State(state): State<AppState>) -> HtmlResult<Html<String>> {
    let lists = state.service.list_todo_lists(SortOrder::Desc).await?;
    Ok(state.views.index(&lists, &TodoListForm::blank())?)
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HtmlResult<Html<String>> {
    let list = state.service.get_todo_list(id).await?;
    let items = state.service.list_items(id, ItemFilter::All).await?;
    Ok(state.views.show(&list, &items, &ItemForm::blank(id))?)
}

pub async fn create_todo_list(
    State(state): State<AppState>,
    Form(data): Form<TodoListFormData>,
) -> HtmlResult<Response> {
    let params = data.params();
    match state.service.create_todo_list(params).await {
        Ok(list) => Ok(state.views.todo_list_created(&list)?.into_response()),
        Err(AppError::Validation(errors)) => {
            let form = TodoListForm {
                name: data.name.unwrap_or_default(),
                errors: errors.full_messages(),
                ..TodoListForm::blank()
            };
            Ok(unprocessable(state.views.todo_list_invalid(&form)?))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn update_todo_list(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(data): Form<TodoListFormData>,
) -> HtmlResult<Response> {
    let params = data.params();
    match state.service.update_todo_list(id, params).await {
        Ok(list) => Ok(state.views.todo_list_updated(&list)?.into_response()),
        Err(AppError::Validation(errors)) => {
            let form = TodoListForm {
                action: format!("/todolists/{id}"),
                name: data.name.unwrap_or_default(),
                errors: errors.full_messages(),
            };
            Ok(unprocessable(state.views.todo_list_invalid(&form)?))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_todo_list(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HtmlResult<TurboStream> {
    state.service.delete_todo_list(id).await?;
    Ok(state.views.todo_list_removed(id)?)
}

pub async fn complete_all(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HtmlResult<TurboStream> {
    state.service.complete_all(id).await?;
    Ok(state.views.complete_all_started()?)
}

pub async fn new_item(
    State(state): State<AppState>,
    Path(todo_list_id): Path<i64>,
) -> HtmlResult<Html<String>> {
    state.service.get_todo_list(todo_list_id).await?;
    Ok(state.views.item_form(&ItemForm::blank(todo_list_id))?)
}

pub async fn show_item(
    State(state): State<AppState>,
    Path((todo_list_id, id)): Path<(i64, i64)>,
) -> HtmlResult<Html<String>> {
    let item = state.service.get_item(todo_list_id, id).await?;
    Ok(state.views.item(&item)?)
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(todo_list_id): Path<i64>,
    Form(data): Form<ItemFormData>,
) -> HtmlResult<Response> {
    match state.service.create_item(todo_list_id, data.params()).await {
        Ok(item) => Ok(state.views.item_created(&item)?.into_response()),
        Err(AppError::Validation(errors)) => {
            let form = data.form(
                ItemForm::blank(todo_list_id).action,
                errors.full_messages(),
            );
            Ok(unprocessable(state.views.item_invalid(&form)?))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((todo_list_id, id)): Path<(i64, i64)>,
    Form(data): Form<ItemFormData>,
) -> HtmlResult<Response> {
    match state.service.update_item(todo_list_id, id, data.params()).await {
        Ok(item) => Ok(state.views.item_replaced(&item)?.into_response()),
        Err(AppError::Validation(errors)) => {
            let form = data.form(
                format!("/todolists/{todo_list_id}/items/{id}"),
                errors.full_messages(),
            );
            Ok(unprocessable(state.views.item_invalid(&form)?))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((todo_list_id, id)): Path<(i64, i64)>,
) -> HtmlResult<TurboStream> {
    let item = state.service.delete_item(todo_list_id, id).await?;
    Ok(state.views.item_removed(&item)?)
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Path((todo_list_id, id)): Path<(i64, i64)>,
) -> HtmlResult<TurboStream> {
    let item = state.service.toggle_item(todo_list_id, id).await?;
    Ok(state.views.item_replaced(&item)?)
}
