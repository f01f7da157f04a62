use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub confirmed: bool,
    pub blocked: bool,
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug)]
struct StoredTodo {
    todo: Todo,
    owner: u64,
}

#[derive(Debug, Default)]
pub struct MockState {
    accounts: Vec<Account>,
    tokens: HashMap<String, u64>,
    todos: Vec<StoredTodo>,
    next_user_id: u64,
    next_todo_id: u64,
}

pub type Db = Arc<RwLock<MockState>>;

#[derive(Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DataInput<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user: Option<Vec<u64>>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Errors rendered in the content API's `{data: null, error: {...}}` envelope.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Application(String),
    #[error("Missing or invalid credentials")]
    Unauthorized,
    #[error("Not Found")]
    NotFound,
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, name) = match &self {
            MockError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            MockError::Application(_) => (StatusCode::BAD_REQUEST, "ApplicationError"),
            MockError::Unauthorized => (StatusCode::UNAUTHORIZED, "UnauthorizedError"),
            MockError::NotFound => (StatusCode::NOT_FOUND, "NotFoundError"),
        };
        let body = json!({
            "data": null,
            "error": {
                "status": status.as_u16(),
                "name": name,
                "message": self.to_string(),
                "details": {},
            }
        });
        (status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(MockState::default()));
    Router::new()
        .route("/auth/local", post(login))
        .route("/auth/local/register", post(register))
        .route("/users/me", get(me))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{document_id}", put(update_todo).delete(delete_todo))
        .with_state(db)
}

/// Serve the API under `/api`, the prefix the client is configured with by
/// default.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let router = Router::new().nest("/api", app());
    axum::serve(listener, router).await
}

fn session_body(state: &mut MockState, user: User) -> Value {
    let jwt = Uuid::new_v4().simple().to_string();
    state.tokens.insert(jwt.clone(), user.id);
    json!({ "jwt": jwt, "user": user })
}

fn caller(state: &MockState, headers: &HeaderMap) -> Result<u64, MockError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(MockError::Unauthorized)?;
    state.tokens.get(token).copied().ok_or(MockError::Unauthorized)
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<Value>, MockError> {
    if input.username.chars().count() < 3 {
        return Err(MockError::Validation(
            "username must be at least 3 characters".to_string(),
        ));
    }
    if !input.email.contains('@') {
        return Err(MockError::Validation("email must be a valid email".to_string()));
    }
    if input.password.chars().count() < 6 {
        return Err(MockError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let mut state = db.write().await;
    let taken = state.accounts.iter().any(|a| {
        a.user.email.eq_ignore_ascii_case(&input.email) || a.user.username == input.username
    });
    if taken {
        return Err(MockError::Application(
            "Email or Username are already taken".to_string(),
        ));
    }

    state.next_user_id += 1;
    let user = User {
        id: state.next_user_id,
        username: input.username,
        email: input.email.to_lowercase(),
        confirmed: true,
        blocked: false,
    };
    state.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    debug!(user_id = user.id, "registered");
    Ok(Json(session_body(&mut state, user)))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> Result<Json<Value>, MockError> {
    let mut state = db.write().await;
    let user = state
        .accounts
        .iter()
        .find(|a| {
            (a.user.email.eq_ignore_ascii_case(&input.identifier)
                || a.user.username == input.identifier)
                && a.password == input.password
        })
        .map(|a| a.user.clone())
        .ok_or_else(|| MockError::Validation("Invalid identifier or password".to_string()))?;
    Ok(Json(session_body(&mut state, user)))
}

async fn me(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, MockError> {
    let state = db.read().await;
    let user_id = caller(&state, &headers)?;
    let user = state
        .accounts
        .iter()
        .find(|a| a.user.id == user_id)
        .map(|a| a.user.clone())
        .ok_or(MockError::Unauthorized)?;
    let mut body = json!(user);
    if params.get("populate").map(String::as_str) == Some("todos") {
        let todos: Vec<&Todo> = state
            .todos
            .iter()
            .filter(|t| t.owner == user_id)
            .map(|t| &t.todo)
            .collect();
        body["todos"] = json!(todos);
    }
    Ok(Json(body))
}

fn param<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str, default: T) -> Result<T, MockError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| MockError::Validation(format!("Invalid {key}: {raw}"))),
    }
}

async fn list_todos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, MockError> {
    let state = db.read().await;
    let user_id = caller(&state, &headers)?;
    let page: i64 = param(&params, "pagination[page]", 1)?;
    let page_size: u64 = param(&params, "pagination[pageSize]", 25)?;
    if page_size == 0 {
        return Err(MockError::Validation("Invalid pagination[pageSize]: 0".to_string()));
    }
    let descending = match params.get("sort").map(String::as_str) {
        None | Some("createdAt:ASC") | Some("createdAt:asc") => false,
        Some("createdAt:DESC") | Some("createdAt:desc") => true,
        Some(other) => return Err(MockError::Validation(format!("Invalid sort: {other}"))),
    };

    let mut owned: Vec<&Todo> = state
        .todos
        .iter()
        .filter(|t| t.owner == user_id)
        .map(|t| &t.todo)
        .collect();
    if descending {
        owned.reverse();
    }
    let total = owned.len() as u64;
    let page_count = total.div_ceil(page_size);
    let data: Vec<&Todo> = if page < 1 {
        Vec::new()
    } else {
        owned
            .into_iter()
            .skip(((page as u64) - 1).saturating_mul(page_size) as usize)
            .take(page_size as usize)
            .collect()
    };

    Ok(Json(json!({
        "data": data,
        "meta": {
            "pagination": {
                "page": page,
                "pageSize": page_size,
                "pageCount": page_count,
                "total": total,
            }
        }
    })))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<DataInput<CreateTodo>>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let mut state = db.write().await;
    let user_id = caller(&state, &headers)?;
    if let Some(users) = &input.data.user {
        if users.iter().any(|id| *id != user_id) {
            return Err(MockError::Application(
                "Todos can only be assigned to yourself".to_string(),
            ));
        }
    }
    state.next_todo_id += 1;
    let todo = Todo {
        id: state.next_todo_id,
        document_id: Uuid::new_v4().simple().to_string(),
        title: input.data.title,
        description: input.data.description.unwrap_or_default(),
    };
    state.todos.push(StoredTodo {
        todo: todo.clone(),
        owner: user_id,
    });
    debug!(id = todo.id, document_id = %todo.document_id, "todo created");
    Ok((StatusCode::CREATED, Json(json!({ "data": todo, "meta": {} }))))
}

async fn update_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
    Json(input): Json<DataInput<UpdateTodo>>,
) -> Result<Json<Value>, MockError> {
    let mut state = db.write().await;
    let user_id = caller(&state, &headers)?;
    let stored = state
        .todos
        .iter_mut()
        .find(|t| t.todo.document_id == document_id && t.owner == user_id)
        .ok_or(MockError::NotFound)?;
    if let Some(title) = input.data.title {
        stored.todo.title = title;
    }
    if let Some(description) = input.data.description {
        stored.todo.description = description;
    }
    Ok(Json(json!({ "data": stored.todo, "meta": {} })))
}

async fn delete_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Result<Json<Value>, MockError> {
    let mut state = db.write().await;
    let user_id = caller(&state, &headers)?;
    let index = state
        .todos
        .iter()
        .position(|t| t.todo.document_id == document_id && t.owner == user_id)
        .ok_or(MockError::NotFound)?;
    let removed = state.todos.remove(index);
    debug!(document_id = %document_id, "todo deleted");
    Ok(Json(json!({ "data": removed.todo, "meta": {} })))
}
