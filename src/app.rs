use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{api, html},
    state::AppState,
};

pub const API_BASE: &str = "/api/v1";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::healthcheck))
        .nest(API_BASE, api_router())
        .merge(html_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/todolists",
            get(api::list_todo_lists).post(api::create_todo_list),
        )
        .route(
            "/todolists/{id}",
            get(api::get_todo_list)
                .patch(api::update_todo_list)
                .delete(api::delete_todo_list),
        )
        .route("/todolists/{id}/complete_all", patch(api::complete_all))
        .route(
            "/todolists/{id}/items",
            get(api::list_items).post(api::create_item),
        )
        .route(
            "/todolists/{id}/items/{item_id}",
            get(api::get_item)
                .patch(api::update_item)
                .delete(api::delete_item),
        )
        .fallback(api::not_found)
        .layer(middleware::from_fn(api::require_json))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
}

fn html_router() -> Router<AppState> {
    Router::new()
        .route("/", get(html::index))
        .route("/assets/app.js", get(html::script))
        .route(
            "/todolists",
            get(html::index).post(html::create_todo_list),
        )
        .route(
            "/todolists/{id}",
            get(html::show)
                .patch(html::update_todo_list)
                .delete(html::delete_todo_list),
        )
        .route("/todolists/{id}/complete_all", patch(html::complete_all))
        .route("/todolists/{id}/items", post(html::create_item))
        .route("/todolists/{id}/items/new", get(html::new_item))
        .route(
            "/todolists/{id}/items/{item_id}",
            get(html::show_item)
                .patch(html::update_item)
                .delete(html::delete_item),
        )
        .route(
            "/todolists/{id}/items/{item_id}/toggle",
            patch(html::toggle_item),
        )
}
