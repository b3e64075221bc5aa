use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Data, Page, Store, Story, Task, Workspace};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn store_with_task() -> (Store, String) {
    let mut store = Store::new();
    let task = store.add_task("Write docs");
    (store, task)
}

// --- workspaces ---

#[tokio::test]
async fn list_workspaces_empty() {
    let resp = app().oneshot(get("/workspaces")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page<Workspace> = body_json(resp).await;
    assert!(page.data.is_empty());
    assert!(page.next_page.is_none());
}

#[tokio::test]
async fn list_workspaces_pages_with_limit() {
    let mut store = Store::new();
    for i in 0..5 {
        store.add_workspace(&format!("W{i}"), false);
    }
    let app = app_with(store);

    let resp = app.clone().oneshot(get("/workspaces?limit=2&opt_fields=name")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page<Workspace> = body_json(resp).await;
    assert_eq!(page.data.len(), 2);
    let next = page.next_page.unwrap();
    assert_eq!(next.offset, "2");

    let resp = app.oneshot(get("/workspaces?limit=2&offset=4")).await.unwrap();
    let page: Page<Workspace> = body_json(resp).await;
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "W4");
    assert!(page.next_page.is_none());
}

#[tokio::test]
async fn next_page_is_null_on_last_page() {
    let resp = app().oneshot(get("/workspaces?limit=10")).await.unwrap();
    let raw: Value = body_json(resp).await;
    assert_eq!(raw, json!({"data": [], "next_page": null}));
}

#[tokio::test]
async fn limit_over_maximum_returns_400_with_errors() {
    let resp = app().oneshot(get("/workspaces?limit=500")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let raw: Value = body_json(resp).await;
    assert_eq!(raw["errors"][0]["message"], "limit: Must be between 1 and 100");
}

#[tokio::test]
async fn bad_offset_returns_400() {
    let resp = app().oneshot(get("/workspaces?limit=10&offset=nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_workspace_found_and_missing() {
    let mut store = Store::new();
    let gid = store.add_workspace("Acme", true);
    let app = app_with(store);

    let resp = app.clone().oneshot(get(&format!("/workspaces/{gid}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ws: Data<Workspace> = body_json(resp).await;
    assert_eq!(ws.data.name, "Acme");
    assert!(ws.data.is_organization);

    let resp = app.oneshot(get("/workspaces/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let raw: Value = body_json(resp).await;
    assert_eq!(raw["errors"][0]["message"], "workspace: Not Found");
}

// --- tasks ---

#[tokio::test]
async fn get_task() {
    let (store, task) = store_with_task();
    let resp = app_with(store).oneshot(get(&format!("/tasks/{task}"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Data<Task> = body_json(resp).await;
    assert_eq!(body.data.name, "Write docs");
}

// --- stories ---

#[tokio::test]
async fn stories_of_missing_task_returns_404() {
    let resp = app().oneshot(get("/tasks/1/stories")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_stories_includes_subtype_fields() {
    let (mut store, task) = store_with_task();
    store.add_story(&task, "name_changed", json!({"old_name": "a", "new_name": "b"}));
    let other = store.add_task("Other");
    store.add_story(&other, "marked_complete", json!({}));

    let resp = app_with(store)
        .oneshot(get(&format!("/tasks/{task}/stories")))
        .await
        .unwrap();
    let raw: Value = body_json(resp).await;
    let data = raw["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["resource_subtype"], "name_changed");
    assert_eq!(data[0]["new_name"], "b");
}

#[tokio::test]
async fn create_comment_returns_201() {
    let (store, task) = store_with_task();
    let resp = app_with(store)
        .oneshot(json_request(
            "POST",
            &format!("/tasks/{task}/stories"),
            r#"{"data":{"text":"Looks good"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Data<Story> = body_json(resp).await;
    assert_eq!(body.data.resource_subtype, "comment_added");
    assert_eq!(body.data.text, "Looks good");
    assert_eq!(body.data.target.gid, task);
}

#[tokio::test]
async fn create_comment_without_text_returns_400() {
    let (store, task) = store_with_task();
    let resp = app_with(store)
        .oneshot(json_request("POST", &format!("/tasks/{task}/stories"), r#"{"data":{}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_comment_malformed_json_returns_422() {
    let (store, task) = store_with_task();
    let resp = app_with(store)
        .oneshot(json_request("POST", &format!("/tasks/{task}/stories"), r#"{"text":"no envelope"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn system_stories_cannot_be_edited_or_pinned() {
    let (mut store, task) = store_with_task();
    let story = store.add_story(&task, "assigned", json!({"assignee": {"gid": "7"}}));
    let app = app_with(store);

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &format!("/stories/{story}"), r#"{"data":{"text":"x"}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(json_request("PUT", &format!("/stories/{story}"), r#"{"data":{"is_pinned":true}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_story_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/stories/1", r#"{"data":{"text":"Nope"}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_story_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/stories/1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full comment lifecycle ---

#[tokio::test]
async fn comment_lifecycle() {
    use tower::Service;

    let (store, task) = store_with_task();
    let mut app = app_with(store).into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/tasks/{task}/stories"),
            r#"{"data":{"text":"First"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Data<Story> = body_json(resp).await;
    let gid = created.data.gid;

    // edit and pin
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/stories/{gid}"),
            r#"{"data":{"text":"Edited","is_pinned":true}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let raw: Value = body_json(resp).await;
    assert_eq!(raw["data"]["text"], "Edited");
    assert_eq!(raw["data"]["is_pinned"], true);
    assert_eq!(raw["data"]["is_edited"], true);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/stories/{gid}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/stories/{gid}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], br#"{"data":{}}"#);

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/stories/{gid}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list — empty again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/tasks/{task}/stories")))
        .await
        .unwrap();
    let page: Page<Story> = body_json(resp).await;
    assert!(page.data.is_empty());
}
