mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{app, create_item, create_list, eventually, send, send_empty, send_json};
use serde_json::json;
use todo_lists::{models::ItemFilter, repository::TodoRepository};

#[tokio::test]
async fn create_and_show_list() {
    let app = app();

    let (status, created) = send_json(
        &app.router,
        Method::POST,
        "/api/v1/todolists",
        json!({ "todo_list": { "name": "New list" } }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "New list");
    assert!(created["created_at"].is_string());

    let id = created["id"].as_i64().expect("id");
    let (status, fetched) = send_empty(&app.router, Method::GET, &format!("/api/v1/todolists/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let mut keys = fetched
        .as_object()
        .expect("list is an object")
        .keys()
        .cloned()
        .collect::<Vec<_>>();
    keys.sort();
    assert_eq!(keys, vec!["created_at", "id", "name", "updated_at"]);
}

#[tokio::test]
async fn index_is_newest_first_and_honours_explicit_order() {
    let app = app();
    let first = create_list(&app.router, "First").await;
    let second = create_list(&app.router, "Second").await;
    let third = create_list(&app.router, "Third").await;

    let (status, lists) = send_empty(&app.router, Method::GET, "/api/v1/todolists").await;
    assert_eq!(status, StatusCode::OK);
    let ids = lists
        .as_array()
        .expect("array")
        .iter()
        .map(|list| list["id"].as_i64().expect("id"))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![third, second, first]);

    let (_, lists) = send_empty(&app.router, Method::GET, "/api/v1/todolists?order=asc").await;
    let ids = lists
        .as_array()
        .expect("array")
        .iter()
        .map(|list| list["id"].as_i64().expect("id"))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![first, second, third]);

    let (status, _) = send_empty(&app.router, Method::GET, "/api/v1/todolists?order=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_does_not_embed_items() {
    let app = app();
    let id = create_list(&app.router, "Groceries").await;
    create_item(&app.router, id, json!({ "title": "Milk" })).await;

    let (_, lists) = send_empty(&app.router, Method::GET, "/api/v1/todolists").await;
    assert!(lists[0].get("items").is_none());
}

#[tokio::test]
async fn blank_name_is_unprocessable() {
    let app = app();
    let (status, body) = send_json(
        &app.router,
        Method::POST,
        "/api/v1/todolists",
        json!({ "todo_list": { "name": "" } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "errors": ["Name can't be blank"] }));
}

#[tokio::test]
async fn missing_root_key_is_a_bad_request() {
    let app = app();

    for payload in [json!({}), json!({ "todo_list": {} }), json!({ "todo_list": null })] {
        let (status, body) =
            send_json(&app.router, Method::POST, "/api/v1/todolists", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "errors": ["Required parameter missing: todo_list"] })
        );
    }

    let (status, body) = send_empty(&app.router, Method::POST, "/api/v1/todolists").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"][0],
        "Required parameter missing: todo_list"
    );
}

#[tokio::test]
async fn present_root_with_null_or_unknown_fields_is_validated() {
    let app = app();

    for payload in [
        json!({ "todo_list": { "name": null } }),
        json!({ "todo_list": { "foo": 1 } }),
        json!({ "todo_list": { "name": "   " } }),
    ] {
        let (status, body) =
            send_json(&app.router, Method::POST, "/api/v1/todolists", payload.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
        assert_eq!(body, json!({ "errors": ["Name can't be blank"] }));
    }

    let list = create_list(&app.router, "Groceries").await;
    let uri = format!("/api/v1/todolists/{list}");

    let (status, body) = send_json(
        &app.router,
        Method::PATCH,
        &uri,
        json!({ "todo_list": { "name": null } }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"], json!(["Name can't be blank"]));

    // unknown fields change nothing
    let (status, body) =
        send_json(&app.router, Method::PATCH, &uri, json!({ "todo_list": { "foo": 1 } })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Groceries");
}

#[tokio::test]
async fn unparseable_ids_are_not_found_in_the_error_envelope() {
    let app = app();

    for uri in [
        "/api/v1/todolists/abc",
        "/api/v1/todolists/99999999999999999999",
        "/api/v1/todolists/abc/items",
    ] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .expect("request should build");
        let response = send(&app.router, request).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            response.content_type.as_deref(),
            Some("application/json"),
            "{uri}"
        );
        assert_eq!(response.json(), json!({ "errors": ["Resource not found"] }));
    }

    let (status, body) = send_empty(&app.router, Method::DELETE, "/api/v1/todolists/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["errors"].is_array());
}

#[tokio::test]
async fn accept_header_is_case_insensitive() {
    let app = app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/todolists")
        .header(header::ACCEPT, "Application/JSON")
        .body(Body::empty())
        .expect("request should build");

    let response = send(&app.router, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/todolists")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"todo_list\":"))
        .expect("request should build");

    let response = send(&app.router, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["errors"].is_array());
}

#[tokio::test]
async fn non_json_representations_are_rejected() {
    let app = app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/todolists")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .expect("request should build");
    let response = send(&app.router, request).await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(
        response.json(),
        json!({ "errors": ["Not supported format"] })
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/todolists")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Groceries"))
        .expect("request should build");
    let response = send(&app.router, request).await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn update_list() {
    let app = app();
    let id = create_list(&app.router, "Setup project").await;
    let uri = format!("/api/v1/todolists/{id}");

    let (status, body) = send_json(
        &app.router,
        Method::PATCH,
        &uri,
        json!({ "todo_list": { "name": "Updated" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Updated");

    let (status, body) = send_json(
        &app.router,
        Method::PATCH,
        &uri,
        json!({ "todo_list": { "name": "  " } }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"], json!(["Name can't be blank"]));

    let (_, fetched) = send_empty(&app.router, Method::GET, &uri).await;
    assert_eq!(fetched["name"], "Updated");
}

#[tokio::test]
async fn unknown_list_is_not_found_everywhere() {
    let app = app();
    let expected = json!({ "errors": ["Todo list not found"] });

    let (status, body) = send_empty(&app.router, Method::GET, "/api/v1/todolists/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);

    let (status, body) = send_json(
        &app.router,
        Method::PATCH,
        "/api/v1/todolists/9999",
        json!({ "todo_list": { "name": "New list" } }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);

    let (status, body) = send_empty(&app.router, Method::DELETE, "/api/v1/todolists/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);

    let (status, body) = send_empty(
        &app.router,
        Method::PATCH,
        "/api/v1/todolists/9999/complete_all",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn deleting_a_list_removes_its_items() {
    let app = app();
    let doomed = create_list(&app.router, "Doomed").await;
    let kept = create_list(&app.router, "Kept").await;
    for title in ["a", "b", "c"] {
        create_item(&app.router, doomed, json!({ "title": title })).await;
    }
    let survivor = create_item(&app.router, kept, json!({ "title": "d" })).await;
    assert_eq!(app.repo.count_items().await.expect("count"), 4);

    let (status, body) =
        send_empty(&app.router, Method::DELETE, &format!("/api/v1/todolists/{doomed}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    assert_eq!(app.repo.count_items().await.expect("count"), 1);
    let (status, _) =
        send_empty(&app.router, Method::GET, &format!("/api/v1/todolists/{doomed}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_empty(
        &app.router,
        Method::GET,
        &format!("/api/v1/todolists/{kept}/items/{}", survivor["id"]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn complete_all_is_accepted_and_runs_in_the_background() {
    let app = app();
    let id = create_list(&app.router, "Groceries").await;
    create_item(&app.router, id, json!({ "title": "Milk" })).await;
    create_item(&app.router, id, json!({ "title": "Eggs" })).await;

    let (status, body) = send_empty(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/todolists/{id}/complete_all"),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "message": "Complete job in process" }));

    let repo = app.repo.clone();
    eventually(|| {
        let repo = repo.clone();
        async move {
            repo.list_items(id, ItemFilter::Pending)
                .await
                .expect("list")
                .is_empty()
        }
    })
    .await;

    let (_, items) = send_empty(
        &app.router,
        Method::GET,
        &format!("/api/v1/todolists/{id}/items"),
    )
    .await;
    let items = items.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["completed"] == true));
}

#[tokio::test]
async fn complete_all_on_empty_list_is_accepted() {
    let app = app();
    let id = create_list(&app.router, "Empty").await;

    let (status, body) = send_empty(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/todolists/{id}/complete_all"),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Complete job in process");
}

#[tokio::test]
async fn healthcheck_and_unknown_api_paths() {
    let app = app();

    let (status, body) = send_empty(&app.router, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ok");

    let (status, body) = send_empty(&app.router, Method::GET, "/api/v1/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "errors": ["Resource not found"] }));
}
