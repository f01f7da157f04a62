//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.
//!
//! Authenticated builders take the bearer token explicitly; there is no
//! shared interceptor.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    DataEnvelope, ErrorEnvelope, LoginInput, PageQuery, Paginated, RegisterInput, Session, Todo,
    TodoDraft, UserWithTodos,
};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, input: &LoginInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/local", input)
    }

    pub fn build_register(&self, input: &RegisterInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/local/register", input)
    }

    pub fn build_me_with_todos(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/users/me?populate=todos")
            .with_bearer(token)
    }

    /// Page numbers are sent as-is, including zero and negatives.
    pub fn build_list_todos(&self, token: &str, query: &PageQuery) -> HttpRequest {
        let path = format!(
            "/todos?pagination[pageSize]={}&pagination[page]={}&sort=createdAt:{}",
            query.page_size, query.page, query.sort
        );
        self.request(HttpMethod::Get, &path).with_bearer(token)
    }

    pub fn build_create_todo(
        &self,
        token: &str,
        user_id: u64,
        draft: &TodoDraft,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({
            "data": {
                "title": draft.title,
                "description": draft.description,
                "user": [user_id],
            }
        });
        Ok(self
            .json_request(HttpMethod::Post, "/todos", &body)?
            .with_bearer(token))
    }

    pub fn build_update_todo(
        &self,
        token: &str,
        document_id: &str,
        draft: &TodoDraft,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({
            "data": {
                "title": draft.title,
                "description": draft.description,
            }
        });
        Ok(self
            .json_request(HttpMethod::Put, &format!("/todos/{document_id}"), &body)?
            .with_bearer(token))
    }

    pub fn build_delete_todo(&self, token: &str, document_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/todos/{document_id}"))
            .with_bearer(token)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Session, ApiError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<Session, ApiError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_me_with_todos(&self, response: HttpResponse) -> Result<UserWithTodos, ApiError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Paginated<Todo>, ApiError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, &[200, 201])?;
        decode::<DataEnvelope<Todo>>(&response.body).map(|env| env.data)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, &[200])?;
        decode::<DataEnvelope<Todo>>(&response.body).map(|env| env.data)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])?;
        Ok(())
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut req = self.request(method, path);
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, accepted: &[u16]) -> Result<(), ApiError> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body) {
        return Err(ApiError::Api {
            status: response.status,
            name: envelope.error.name,
            message: envelope.error.message,
        });
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
