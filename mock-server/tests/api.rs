use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Todo};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

/// Register `username` and return its jwt and user id.
async fn register(app: &Router, username: &str) -> (String, u64) {
    let body = format!(
        r#"{{"username":"{username}","email":"{username}@example.com","password":"password1"}}"#
    );
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/local/register", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let session: Value = body_json(resp).await;
    (
        session["jwt"].as_str().unwrap().to_string(),
        session["user"]["id"].as_u64().unwrap(),
    )
}

async fn create(app: &Router, token: &str, title: &str) -> Todo {
    let body = format!(r#"{{"data":{{"title":"{title}","description":"d"}}}}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos", Some(token), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = body_json(resp).await;
    serde_json::from_value(created["data"].clone()).unwrap()
}

// --- auth ---

#[tokio::test]
async fn register_then_login_by_email() {
    let app = app();
    let (_, user_id) = register(&app, "walter").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/local",
            None,
            r#"{"identifier":"walter@example.com","password":"password1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let session: Value = body_json(resp).await;
    assert!(!session["jwt"].as_str().unwrap().is_empty());
    assert_eq!(session["user"]["id"], user_id);
    assert_eq!(session["user"]["username"], "walter");
}

#[tokio::test]
async fn login_with_wrong_password_returns_error_envelope() {
    let app = app();
    register(&app, "walter").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/local",
            None,
            r#"{"identifier":"walter@example.com","password":"nope-nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["data"].is_null());
    assert_eq!(body["error"]["message"], "Invalid identifier or password");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = app();
    register(&app, "walter").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/local/register",
            None,
            r#"{"username":"walter","email":"other@example.com","password":"password1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Email or Username are already taken");
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/me?populate=todos")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- todos ---

#[tokio::test]
async fn me_populates_only_own_todos() {
    let app = app();
    let (alice, _) = register(&app, "alice1").await;
    let (bob, _) = register(&app, "bobby1").await;
    create(&app, &alice, "alice todo").await;
    create(&app, &bob, "bob todo").await;

    let resp = app
        .clone()
        .oneshot(authed("GET", "/users/me?populate=todos", &alice))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = body_json(resp).await;
    let todos: Vec<Todo> = serde_json::from_value(me["todos"].clone()).unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "alice todo");
}

#[tokio::test]
async fn create_for_another_user_is_rejected() {
    let app = app();
    let (token, user_id) = register(&app, "walter").await;
    let body = format!(r#"{{"data":{{"title":"x","user":[{}]}}}}"#, user_id + 1);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos", Some(&token), &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let app = app();
    let (token, _) = register(&app, "walter").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos", Some(&token), r#"{"data":{"not_title":1}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pagination_and_sort() {
    let app = app();
    let (token, _) = register(&app, "walter").await;
    for i in 1..=5 {
        create(&app, &token, &format!("todo {i}")).await;
    }

    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            "/todos?pagination[pageSize]=2&pagination[page]=1&sort=createdAt:DESC",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = body_json(resp).await;
    let titles: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["todo 5", "todo 4"]);
    assert_eq!(page["meta"]["pagination"]["pageCount"], 3);
    assert_eq!(page["meta"]["pagination"]["total"], 5);

    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            "/todos?pagination[pageSize]=2&pagination[page]=3&sort=createdAt:ASC",
            &token,
        ))
        .await
        .unwrap();
    let page: Value = body_json(resp).await;
    assert_eq!(page["data"][0]["title"], "todo 5");
}

#[tokio::test]
async fn out_of_range_pages_are_empty() {
    let app = app();
    let (token, _) = register(&app, "walter").await;
    create(&app, &token, "only").await;

    for uri in [
        "/todos?pagination[pageSize]=10&pagination[page]=2&sort=createdAt:DESC",
        "/todos?pagination[pageSize]=10&pagination[page]=0&sort=createdAt:DESC",
        "/todos?pagination[pageSize]=10&pagination[page]=-3&sort=createdAt:DESC",
    ] {
        let resp = app.clone().oneshot(authed("GET", uri, &token)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let page: Value = body_json(resp).await;
        assert!(page["data"].as_array().unwrap().is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn update_and_delete_unknown_document_return_404() {
    let app = app();
    let (token, _) = register(&app, "walter").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/todos/missing",
            Some(&token),
            r#"{"data":{"title":"Nope"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(authed("DELETE", "/todos/missing", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let app = app();
    let (token, _) = register(&app, "walter").await;

    // create
    let created = create(&app, &token, "Walk dog").await;
    assert_eq!(created.title, "Walk dog");
    let document_id = created.document_id.clone();

    // update: partial: only title
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/todos/{document_id}"),
            Some(&token),
            r#"{"data":{"title":"Walk cat"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = body_json(resp).await;
    assert_eq!(updated["data"]["title"], "Walk cat");
    assert_eq!(updated["data"]["description"], "d"); // unchanged

    // delete
    let resp = app
        .clone()
        .oneshot(authed("DELETE", &format!("/todos/{document_id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // list after delete: empty
    let resp = app
        .clone()
        .oneshot(authed("GET", "/users/me?populate=todos", &token))
        .await
        .unwrap();
    let me: Value = body_json(resp).await;
    assert!(me["todos"].as_array().unwrap().is_empty());
}
