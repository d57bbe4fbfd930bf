use axum::{
    Json,
    extract::{Query, Request, State, rejection::QueryRejection},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    app::API_BASE,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, accepts_json},
    models::{
        ApiMessage, Item, ItemBody, ItemParams, ListItemsQuery, ListTodoListsQuery, TodoList,
        TodoListBody, TodoListParams,
    },
    state::AppState,
};

pub const COMPLETE_ALL_ACCEPTED: &str = "Complete job in process";

pub async fn healthcheck() -> Json<ApiMessage> {
    Json(ApiMessage::new("ok"))
}

/// Rejects API requests asking for anything other than JSON.
pub async fn require_json(request: Request, next: Next) -> AppResult<Response> {
    if !accepts_json(request.headers()) {
        return Err(AppError::UnsupportedFormat);
    }
    Ok(next.run(request).await)
}

pub async fn not_found() -> AppError {
    AppError::not_found("Resource not found")
}

pub async fn list_todo_lists(
    State(state): State<AppState>,
    query: Result<Query<ListTodoListsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<TodoList>>> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let lists = state.service.list_todo_lists(query.order).await?;
    Ok(Json(lists))
}

pub async fn get_todo_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<TodoList>> {
    Ok(Json(state.service.get_todo_list(id).await?))
}

pub async fn create_todo_list(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TodoListBody>,
) -> AppResult<(StatusCode, Json<TodoList>)> {
    let params = require_todo_list(body)?;
    let list = state.service.create_todo_list(params).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_todo_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<TodoListBody>,
) -> AppResult<Json<TodoList>> {
    // an unknown list takes precedence over a missing parameter
    state.service.get_todo_list(id).await?;
    let params = require_todo_list(body)?;
    Ok(Json(state.service.update_todo_list(id, params).await?))
}

pub async fn delete_todo_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.service.delete_todo_list(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_all(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<(StatusCode, Json<ApiMessage>)> {
    state.service.complete_all(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiMessage::new(COMPLETE_ALL_ACCEPTED)),
    ))
}

pub async fn list_items(
    State(state): State<AppState>,
    ApiPath(todo_list_id): ApiPath<i64>,
    query: Result<Query<ListItemsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Item>>> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let items = state.service.list_items(todo_list_id, query.status).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    ApiPath((todo_list_id, id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<Item>> {
    Ok(Json(state.service.get_item(todo_list_id, id).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    ApiPath(todo_list_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ItemBody>,
) -> AppResult<Response> {
    state.service.get_todo_list(todo_list_id).await?;
    let params = require_item(body)?;
    let item = state.service.create_item(todo_list_id, params).await?;

    let location = format!("{API_BASE}/todolists/{todo_list_id}/items/{}", item.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(item),
    )
        .into_response())
}

pub async fn update_item(
    State(state): State<AppState>,
    ApiPath((todo_list_id, id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<ItemBody>,
) -> AppResult<Json<Item>> {
    state.service.get_item(todo_list_id, id).await?;
    let params = require_item(body)?;
    let item = state
        .service
        .update_item(todo_list_id, id, params)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    ApiPath((todo_list_id, id)): ApiPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.service.delete_item(todo_list_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_todo_list(body: TodoListBody) -> AppResult<TodoListParams> {
    require_root("todo_list", body.todo_list)
}

fn require_item(body: ItemBody) -> AppResult<ItemParams> {
    require_root("item", body.item)
}

/// An absent, `null` or `{}` root is a missing parameter. Anything else,
/// including fields set to `null`, goes on to validation.
fn require_root<T: DeserializeOwned>(key: &str, root: Option<Map<String, Value>>) -> AppResult<T> {
    let fields = root
        .filter(|fields| !fields.is_empty())
        .ok_or_else(|| AppError::missing_parameter(key))?;
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| AppError::bad_request(err.to_string()))
}
