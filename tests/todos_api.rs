use reqwest::StatusCode;
use serde_json::json;
use todo_api::{
    routes::todo::{MAX_TITLE_LEN, Todo},
    testing::TestHost,
    utils::{ApiResponse, error_codes},
};

async fn create(client: &todo_api::testing::TestClient, title: &str) -> Todo {
    let response = client
        .post("/todos")
        .json(&json!({ "title": title }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: ApiResponse<Todo> = response.json().await.unwrap();
    assert_eq!(body.code, error_codes::SUCCESS);
    body.resp_data.unwrap()
}

#[tokio::test]
async fn crud_round_trip_for_one_user() {
    let host = TestHost::start().await.unwrap();
    let client = host.client_for("alice", false).unwrap();

    let todo = create(&client, "  buy milk  ").await;
    assert_eq!(todo.title, "buy milk");
    assert_eq!(todo.owner_id, "alice");
    assert!(!todo.is_complete);

    let fetched: ApiResponse<Todo> = client
        .get(&format!("/todos/{}", todo.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.resp_data.unwrap(), todo);

    let response = client
        .put(&format!("/todos/{}", todo.id))
        .json(&json!({ "is_complete": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<ApiResponse<Todo>>().await.unwrap().resp_data.unwrap();
    assert!(updated.is_complete);
    assert_eq!(updated.title, "buy milk");

    let response = client
        .delete(&format!("/todos/{}", todo.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(&format!("/todos/{}", todo.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ApiResponse<()> = response.json().await.unwrap();
    assert_eq!(body.code, error_codes::NOT_FOUND);

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_is_scoped_to_the_caller_and_filterable() {
    let host = TestHost::start().await.unwrap();
    let alice = host.client_for("alice", false).unwrap();
    let bob = host.client_for("bob", false).unwrap();

    let first = create(&alice, "first").await;
    create(&alice, "second").await;
    create(&bob, "bob's").await;

    alice
        .put(&format!("/todos/{}", first.id))
        .json(&json!({ "is_complete": true }))
        .send()
        .await
        .unwrap();

    let all: ApiResponse<Vec<Todo>> = alice
        .get("/todos")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<_> = all.resp_data.unwrap().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["first", "second"]);

    let done: ApiResponse<Vec<Todo>> = alice
        .get("/todos?completed=true")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let done = done.resp_data.unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, first.id);

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn other_users_todos_look_missing() {
    let host = TestHost::start().await.unwrap();
    let alice = host.client_for("alice", false).unwrap();
    let bob = host.client_for("bob", false).unwrap();

    let todo = create(&alice, "private").await;
    let path = format!("/todos/{}", todo.id);

    let status = bob.get(&path).send().await.unwrap().status();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = bob
        .put(&path)
        .json(&json!({ "title": "mine now" }))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = bob.delete(&path).send().await.unwrap().status();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let still_there = Todo::find_for_owner(host.db(), todo.id, "alice").await.unwrap();
    assert_eq!(still_there.unwrap().title, "private");

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_titles_are_rejected() {
    let host = TestHost::start().await.unwrap();
    let client = host.client_for("alice", false).unwrap();

    let response = client
        .post("/todos")
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = response.json().await.unwrap();
    assert_eq!(body.code, error_codes::VALIDATION_ERROR);

    let todo = create(&client, "ok").await;
    let response = client
        .put(&format!("/todos/{}", todo.id))
        .json(&json!({ "title": "x".repeat(MAX_TITLE_LEN + 1) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn seeded_rows_are_visible_through_the_api() {
    let host = TestHost::start().await.unwrap();
    Todo::create(host.db(), "alice", "seeded directly", true)
        .await
        .unwrap();

    let client = host.client_for("alice", false).unwrap();
    let body: ApiResponse<Vec<Todo>> = client
        .get("/todos")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let todos = body.resp_data.unwrap();

    assert_eq!(todos.len(), 1);
    assert!(todos[0].is_complete);

    host.shutdown().await.unwrap();
}

async fn assert_validation_error(response: reqwest::Response) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = response.json().await.unwrap();
    assert_eq!(body.code, error_codes::VALIDATION_ERROR);
    assert!(!body.msg.is_empty());
}

#[tokio::test]
async fn malformed_json_bodies_use_the_envelope() {
    let host = TestHost::start().await.unwrap();
    let client = host.client_for("alice", false).unwrap();

    let response = client
        .post("/todos")
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{title: oops")
        .send()
        .await
        .unwrap();
    assert_validation_error(response).await;

    let response = client
        .post("/todos")
        .json(&json!({ "title": "x", "is_complete": null }))
        .send()
        .await
        .unwrap();
    assert_validation_error(response).await;

    let response = client
        .post("/todos")
        .body(r#"{"title": "no content type"}"#)
        .send()
        .await
        .unwrap();
    assert_validation_error(response).await;

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn malformed_query_strings_use_the_envelope() {
    let host = TestHost::start().await.unwrap();
    let client = host.client_for("alice", false).unwrap();

    let response = client.get("/todos?completed=maybe").send().await.unwrap();
    assert_validation_error(response).await;

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn malformed_path_ids_use_the_envelope() {
    let host = TestHost::start().await.unwrap();
    let client = host.client_for("alice", false).unwrap();
    let admin = host.client_for("root", true).unwrap();

    assert_validation_error(client.get("/todos/abc").send().await.unwrap()).await;
    assert_validation_error(
        client
            .put("/todos/abc")
            .json(&json!({ "is_complete": true }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_validation_error(client.delete("/todos/1.5").send().await.unwrap()).await;
    assert_validation_error(admin.delete("/admin/todos/abc").send().await.unwrap()).await;

    host.shutdown().await.unwrap();
}
