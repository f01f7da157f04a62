//! Paginated listing of todos.
//!
//! One controller serves both variants of the page: with controls the user
//! may change sort order and page size; without, both stay at their
//! defaults and only previous/next are available.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::paginator::{Paginator, PaginatorView, PAGE_SIZES};
use crate::query::{QueryClient, QueryKey, QueryOptions, QueryState};
use crate::session::SessionProvider;
use crate::types::{Paginated, SortDirection, Todo};

use super::todo_list::SKELETON_ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodosPageConfig {
    pub show_controls: bool,
}

impl Default for TodosPageConfig {
    fn default() -> Self {
        Self {
            show_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: u64,
    /// 1-based position within the rendered page.
    pub position: usize,
    pub title: String,
}

impl TodoRow {
    pub fn label(&self) -> String {
        format!("{} - {}- {}", self.id, self.position, self.title)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodosView {
    Loading { skeleton_rows: usize },
    Ready {
        rows: Vec<TodoRow>,
        paginator: Option<PaginatorView>,
        /// The last failed fetch, if any.
        error: Option<String>,
    },
}

impl TodosView {
    pub fn error(&self) -> Option<&str> {
        match self {
            TodosView::Ready { error, .. } => error.as_deref(),
            TodosView::Loading { .. } => None,
        }
    }
}

pub struct TodosPage<'a> {
    client: &'a ApiClient,
    transport: &'a dyn Transport,
    session: &'a dyn SessionProvider,
    cache: QueryClient<Paginated<Todo>>,
    paginator: Paginator,
    config: TodosPageConfig,
}

impl<'a> TodosPage<'a> {
    pub fn new(
        client: &'a ApiClient,
        transport: &'a dyn Transport,
        session: &'a dyn SessionProvider,
        config: TodosPageConfig,
    ) -> Self {
        Self {
            client,
            transport,
            session,
            cache: QueryClient::with_options(QueryOptions::default()),
            paginator: Paginator::new(),
            config,
        }
    }

    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.cache = QueryClient::with_options(options);
        self
    }

    pub fn config(&self) -> TodosPageConfig {
        self.config
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn key(&self) -> QueryKey {
        let q = self.paginator.query();
        QueryKey::new([
            format!("todo-page-{}", q.page),
            q.page_size.to_string(),
            q.sort.to_string(),
        ])
    }

    pub fn pending_view(&self) -> TodosView {
        view_of(self.paginator.page(), self.cache.peek(&self.key()))
    }

    pub fn load(&mut self) -> Result<TodosView, ApiError> {
        let token = self.session.current_token()?;
        let client = self.client;
        let key = self.key();
        let request = client.build_list_todos(&token, &self.paginator.query());
        let state = self.cache.use_query(key, None, request, self.transport, |resp| {
            client.parse_list_todos(resp)
        });
        Ok(view_of(self.paginator.page(), state))
    }

    pub fn prev(&mut self) {
        self.paginator.prev();
    }

    pub fn next(&mut self) {
        self.paginator.next();
    }

    pub fn go_to(&mut self, page: i64) {
        self.paginator.go_to(page);
    }

    /// Returns false when controls are hidden or the size is not offered.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !self.config.show_controls || !PAGE_SIZES.contains(&page_size) {
            return false;
        }
        self.paginator.set_page_size(page_size);
        true
    }

    /// Returns false when controls are hidden.
    pub fn set_sort(&mut self, sort: SortDirection) -> bool {
        if !self.config.show_controls {
            return false;
        }
        self.paginator.set_sort(sort);
        true
    }
}

fn view_of(page: i64, state: QueryState<Paginated<Todo>>) -> TodosView {
    if state.is_loading {
        return TodosView::Loading {
            skeleton_rows: SKELETON_ROWS,
        };
    }
    let busy = state.is_loading || state.is_fetching;
    let error = state.error;
    match state.data {
        None => TodosView::Ready {
            rows: Vec::new(),
            paginator: None,
            error,
        },
        Some(page_data) => {
            let paginator = Some(PaginatorView::new(page, &page_data.meta.pagination, busy));
            let rows = page_data
                .data
                .into_iter()
                .rev()
                .enumerate()
                .map(|(index, todo)| TodoRow {
                    id: todo.id,
                    position: index + 1,
                    title: todo.title,
                })
                .collect();
            TodosView::Ready {
                rows,
                paginator,
                error,
            }
        }
    }
}
