//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the external content API's JSON but are defined
//! independently from the mock-server crate; integration tests catch any
//! schema drift between the two. Wire names are camelCase, Rust names are
//! snake_case, `serde(rename)` bridges them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// The identity half of a session.
///
/// Unknown fields returned by the server are kept in `extra` so a stored
/// session round-trips the login payload exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A logged-in user: bearer token plus identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub jwt: String,
    pub user: User,
}

/// A single todo item.
///
/// `document_id` addresses the item for update and delete; `id` is only
/// ever displayed or used as a list key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl Todo {
    pub fn draft(&self) -> TodoDraft {
        TodoDraft {
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// The editable fields of a todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
}

/// Payload of `POST /auth/local`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

/// Payload of `POST /auth/local/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response of `GET /users/me?populate=todos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserWithTodos {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

/// Server-reported pagination metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    pub pagination: PaginationMeta,
}

/// A page of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

/// Single-entity response wrapper: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// The body the API sends along with a 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    #[serde(default)]
    pub name: String,
    pub message: String,
}

/// `createdAt` sort order for the paginated listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Label shown next to the sort selector.
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Asc => "Oldest",
            SortDirection::Desc => "Latest",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Query parameters of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageQuery {
    /// 1-based and deliberately signed: the paginator never clamps.
    pub page: i64,
    pub page_size: u32,
    pub sort: SortDirection,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            sort: SortDirection::Desc,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
