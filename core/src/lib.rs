//! Client core for a hosted todo content API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host supplies a
//! `Transport` that executes the round trip, making every page controller
//! deterministic and testable.
//!
//! # Design
//! - `ApiClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Authenticated pages read the bearer token through an injected
//!   `SessionProvider`; nothing reads storage behind their back.
//! - List views go through a keyed `QueryClient`; mutations bump a version
//!   segment of the key and invalidate the affected resource.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod notify;
pub mod pages;
pub mod paginator;
pub mod query;
pub mod session;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use session::{FileSessionStore, MemorySessionStore, SessionProvider, SessionStore};
pub use types::{
    LoginInput, PageQuery, Paginated, RegisterInput, Session, SortDirection, Todo, TodoDraft,
    User, UserWithTodos,
};
