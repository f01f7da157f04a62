//! The signed-in user's todo list with add, edit, remove and bulk generate.
//!
//! # Design
//! The list is read from `/users/me?populate=todos` under the key
//! `["todoList", version]`. Every successful mutation bumps the version by
//! exactly one and invalidates the user's todo resource, so the next `load`
//! refetches the whole list.
//!
//! Each dialog is a small state machine. A failed submit returns to the
//! editable (or confirming) state with the error attached and the draft
//! intact, so the user can retry from the same dialog.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::query::{QueryClient, QueryKey, QueryOptions, QueryState, QueryVersion, Resource};
use crate::session::SessionProvider;
use crate::types::{Todo, TodoDraft, UserWithTodos};

pub const DEFAULT_GENERATE_COUNT: usize = 100;
pub const SKELETON_ROWS: usize = 3;
const TITLE_REQUIRED: &str = "Title is required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing {
        todo: Todo,
        draft: TodoDraft,
        error: Option<String>,
    },
    Submitting {
        todo: Todo,
        draft: TodoDraft,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddState {
    Closed,
    Open {
        draft: TodoDraft,
        error: Option<String>,
    },
    Submitting {
        draft: TodoDraft,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    Confirming { todo: Todo, error: Option<String> },
    Submitting { todo: Todo },
}

/// Result of submitting a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Done,
    Failed(String),
    /// The dialog was not open.
    NotOpen,
}

/// What the list area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading { skeleton_rows: usize },
    /// Newest first. Empty with no `error` renders as "No Todos Yet!".
    /// `error` is the last failed fetch; `rows` then holds whatever was cached.
    Ready {
        rows: Vec<Todo>,
        is_fetching: bool,
        error: Option<String>,
    },
}

impl ListView {
    pub fn error(&self) -> Option<&str> {
        match self {
            ListView::Ready { error, .. } => error.as_deref(),
            ListView::Loading { .. } => None,
        }
    }
}

pub struct TodoList<'a> {
    client: &'a ApiClient,
    transport: &'a dyn Transport,
    session: &'a dyn SessionProvider,
    cache: QueryClient<UserWithTodos>,
    version: QueryVersion,
    editor: EditorState,
    add: AddState,
    delete: DeleteState,
}

impl<'a> TodoList<'a> {
    pub fn new(
        client: &'a ApiClient,
        transport: &'a dyn Transport,
        session: &'a dyn SessionProvider,
    ) -> Self {
        Self::with_query_options(client, transport, session, QueryOptions::default())
    }

    pub fn with_query_options(
        client: &'a ApiClient,
        transport: &'a dyn Transport,
        session: &'a dyn SessionProvider,
        options: QueryOptions,
    ) -> Self {
        Self {
            client,
            transport,
            session,
            cache: QueryClient::with_options(options),
            version: QueryVersion::new(),
            editor: EditorState::Idle,
            add: AddState::Closed,
            delete: DeleteState::Idle,
        }
    }

    pub fn version(&self) -> QueryVersion {
        self.version
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(["todoList".to_string(), self.version.to_string()])
    }

    /// What to render while `load` is outstanding.
    pub fn pending_view(&self) -> ListView {
        view_of(self.cache.peek(&self.key()))
    }

    /// Fetch (or reuse) the list. Fails only when nobody is logged in.
    pub fn load(&mut self) -> Result<ListView, ApiError> {
        let token = self.session.current_token()?;
        let user_id = self.session.current_user_id()?;
        let client = self.client;
        let key = self.key();
        let state = self.cache.use_query(
            key,
            Some(Resource::TodosOfUser(user_id)),
            client.build_me_with_todos(&token),
            self.transport,
            |resp| client.parse_me_with_todos(resp),
        );
        Ok(view_of(state))
    }

    fn mutated(&mut self) {
        self.version.bump();
        if let Ok(user_id) = self.session.current_user_id() {
            self.cache.invalidate(&Resource::TodosOfUser(user_id));
        }
        debug!(version = %self.version, "todo list version bumped");
    }

    // -- edit -----------------------------------------------------------

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn open_editor(&mut self, todo: &Todo) {
        self.editor = EditorState::Editing {
            todo: todo.clone(),
            draft: todo.draft(),
            error: None,
        };
    }

    pub fn editor_draft_mut(&mut self) -> Option<&mut TodoDraft> {
        match &mut self.editor {
            EditorState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn close_editor(&mut self) {
        self.editor = EditorState::Idle;
    }

    pub fn submit_edit(&mut self) -> MutationOutcome {
        let (todo, draft) = match std::mem::replace(&mut self.editor, EditorState::Idle) {
            EditorState::Editing { todo, draft, .. } => (todo, draft),
            other => {
                self.editor = other;
                return MutationOutcome::NotOpen;
            }
        };
        if draft.title.is_empty() {
            self.editor = EditorState::Editing {
                todo,
                draft,
                error: Some(TITLE_REQUIRED.to_string()),
            };
            return MutationOutcome::Failed(TITLE_REQUIRED.to_string());
        }

        self.editor = EditorState::Submitting {
            todo: todo.clone(),
            draft: draft.clone(),
        };
        match self.send_update(&todo.document_id, &draft) {
            Ok(_) => {
                self.editor = EditorState::Idle;
                self.mutated();
                MutationOutcome::Done
            }
            Err(e) => {
                warn!(document_id = %todo.document_id, error = %e, "update failed");
                let message = user_message(&e);
                self.editor = EditorState::Editing {
                    todo,
                    draft,
                    error: Some(message.clone()),
                };
                MutationOutcome::Failed(message)
            }
        }
    }

    fn send_update(&self, document_id: &str, draft: &TodoDraft) -> Result<Todo, ApiError> {
        let token = self.session.current_token()?;
        let request = self.client.build_update_todo(&token, document_id, draft)?;
        self.client.parse_update_todo(self.transport.execute(request)?)
    }

    // -- add ------------------------------------------------------------

    pub fn add_dialog(&self) -> &AddState {
        &self.add
    }

    pub fn open_add(&mut self) {
        if matches!(self.add, AddState::Closed) {
            self.add = AddState::Open {
                draft: TodoDraft::default(),
                error: None,
            };
        }
    }

    pub fn add_draft_mut(&mut self) -> Option<&mut TodoDraft> {
        match &mut self.add {
            AddState::Open { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Closing discards the draft.
    pub fn close_add(&mut self) {
        self.add = AddState::Closed;
    }

    pub fn submit_add(&mut self) -> MutationOutcome {
        let draft = match std::mem::replace(&mut self.add, AddState::Closed) {
            AddState::Open { draft, .. } => draft,
            other => {
                self.add = other;
                return MutationOutcome::NotOpen;
            }
        };
        if draft.title.is_empty() {
            self.add = AddState::Open {
                draft,
                error: Some(TITLE_REQUIRED.to_string()),
            };
            return MutationOutcome::Failed(TITLE_REQUIRED.to_string());
        }

        self.add = AddState::Submitting {
            draft: draft.clone(),
        };
        match self.send_create(&draft) {
            Ok(todo) => {
                debug!(document_id = %todo.document_id, "todo created");
                self.add = AddState::Closed;
                self.mutated();
                MutationOutcome::Done
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                let message = user_message(&e);
                self.add = AddState::Open {
                    draft,
                    error: Some(message.clone()),
                };
                MutationOutcome::Failed(message)
            }
        }
    }

    fn send_create(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
        let token = self.session.current_token()?;
        let user_id = self.session.current_user_id()?;
        let request = self.client.build_create_todo(&token, user_id, draft)?;
        self.client.parse_create_todo(self.transport.execute(request)?)
    }

    // -- delete ---------------------------------------------------------

    pub fn delete_dialog(&self) -> &DeleteState {
        &self.delete
    }

    pub fn request_delete(&mut self, todo: &Todo) {
        self.delete = DeleteState::Confirming {
            todo: todo.clone(),
            error: None,
        };
    }

    pub fn cancel_delete(&mut self) {
        self.delete = DeleteState::Idle;
    }

    pub fn confirm_delete(&mut self) -> MutationOutcome {
        let todo = match std::mem::replace(&mut self.delete, DeleteState::Idle) {
            DeleteState::Confirming { todo, .. } => todo,
            other => {
                self.delete = other;
                return MutationOutcome::NotOpen;
            }
        };

        self.delete = DeleteState::Submitting { todo: todo.clone() };
        let result = self.session.current_token().and_then(|token| {
            let request = self.client.build_delete_todo(&token, &todo.document_id);
            self.client.parse_delete_todo(self.transport.execute(request)?)
        });
        match result {
            Ok(()) => {
                self.delete = DeleteState::Idle;
                self.mutated();
                MutationOutcome::Done
            }
            Err(e) => {
                warn!(document_id = %todo.document_id, error = %e, "delete failed");
                let message = user_message(&e);
                self.delete = DeleteState::Confirming {
                    todo,
                    error: Some(message.clone()),
                };
                MutationOutcome::Failed(message)
            }
        }
    }

    // -- bulk -----------------------------------------------------------

    /// Create `count` random todos one after another. Individual failures are
    /// logged and skipped. The list is invalidated once at the end, and only
    /// when something was created. Returns how many were created.
    pub fn generate(&mut self, count: usize) -> usize {
        let mut rng = rand::thread_rng();
        let mut created = 0;
        for index in 0..count {
            let draft = generated_draft(&mut rng);
            match self.send_create(&draft) {
                Ok(_) => created += 1,
                Err(e) => warn!(index, error = %e, "generated todo not created"),
            }
        }
        if created > 0 {
            self.mutated();
        }
        created
    }
}

fn view_of(state: QueryState<UserWithTodos>) -> ListView {
    if state.is_loading {
        return ListView::Loading {
            skeleton_rows: SKELETON_ROWS,
        };
    }
    let mut rows = state.data.map(|me| me.todos).unwrap_or_default();
    rows.reverse();
    ListView::Ready {
        rows,
        is_fetching: state.is_fetching,
        error: state.error,
    }
}

fn user_message(err: &ApiError) -> String {
    err.server_message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

const WORDS: &[&str] = &[
    "alias", "amet", "aperiam", "autem", "beatae", "blanditiis", "commodi", "consequatur",
    "corporis", "culpa", "cumque", "debitis", "delectus", "dolor", "dolorem", "ducimus", "eius",
    "eligendi", "enim", "error", "esse", "eveniet", "facere", "fugiat", "harum", "illum",
    "impedit", "ipsam", "laborum", "magnam", "maxime", "minima", "molestiae", "natus", "nemo",
    "nihil", "nobis", "odio", "officia", "omnis", "optio", "pariatur", "placeat", "porro",
    "quaerat", "quidem", "quis", "ratione", "rem", "repellat", "saepe", "sequi", "similique",
    "sint", "sunt", "tempora", "tenetur", "totam", "ullam", "veniam", "vero", "voluptas",
];

fn words(rng: &mut impl Rng, n: usize) -> Vec<&'static str> {
    (0..n)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect()
}

fn sentence(rng: &mut impl Rng) -> String {
    let n = rng.gen_range(6..12);
    let mut text = words(rng, n).join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn generated_draft(rng: &mut impl Rng) -> TodoDraft {
    TodoDraft {
        title: words(rng, 5).join(" "),
        description: format!("{} {}", sentence(rng), sentence(rng)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{Session, User};

    fn session_store() -> MemorySessionStore {
        MemorySessionStore::with_session(Session {
            jwt: "tok".to_string(),
            user: User {
                id: 5,
                username: "walter".to_string(),
                email: "w@x.io".to_string(),
                extra: Default::default(),
            },
        })
    }

    fn todo(id: u64) -> Todo {
        Todo {
            id,
            document_id: format!("doc-{id}"),
            title: format!("todo {id}"),
            description: String::new(),
        }
    }

    fn me_body(ids: &[u64]) -> String {
        let todos: Vec<Todo> = ids.iter().copied().map(todo).collect();
        serde_json::json!({ "id": 5, "username": "walter", "email": "w@x.io", "todos": todos })
            .to_string()
    }

    fn created_body(id: u64) -> String {
        serde_json::json!({ "data": todo(id) }).to_string()
    }

    const NO_RETRY: QueryOptions = QueryOptions { retry: 0 };

    #[test]
    fn load_lists_newest_first_and_caches() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new().ok(&me_body(&[1, 2, 3]));
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        assert_eq!(list.pending_view(), ListView::Loading { skeleton_rows: 3 });
        let view = list.load().unwrap();
        let ListView::Ready { rows, .. } = view else {
            panic!("expected rows");
        };
        let ids: Vec<u64> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, [3, 2, 1]);

        list.load().unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn load_without_session_fails_cleanly() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new();
        let store = MemorySessionStore::new();
        let mut list = TodoList::new(&client, &transport, &store);

        assert!(matches!(list.load(), Err(ApiError::MissingSession)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn add_success_bumps_version_and_refetches() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new()
            .ok(&me_body(&[1]))
            .status(201, &created_body(2))
            .ok(&me_body(&[1, 2]));
        let store = session_store();
        let mut list = TodoList::with_query_options(&client, &transport, &store, NO_RETRY);

        list.load().unwrap();
        list.open_add();
        list.add_draft_mut().unwrap().title = "todo 2".to_string();
        assert_eq!(list.submit_add(), MutationOutcome::Done);
        assert_eq!(list.add_dialog(), &AddState::Closed);
        assert_eq!(list.version().get(), 2);

        let ListView::Ready { rows, .. } = list.load().unwrap() else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].id, 2);
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, HttpMethod::Post);
        let body: serde_json::Value =
            serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["data"]["user"], serde_json::json!([5]));
    }

    #[test]
    fn add_with_empty_title_sends_nothing() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new();
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        list.open_add();
        assert_eq!(
            list.submit_add(),
            MutationOutcome::Failed("Title is required".to_string())
        );
        assert!(matches!(list.add_dialog(), AddState::Open { error: Some(_), .. }));
        assert!(transport.requests().is_empty());
        assert_eq!(list.version().get(), 1);
    }

    #[test]
    fn edit_failure_keeps_draft_and_reports_error() {
        let client = ApiClient::new("http://api");
        let forbidden = r#"{"data":null,"error":{"status":403,"name":"ForbiddenError","message":"Forbidden"}}"#;
        let transport = ScriptedTransport::new().status(403, forbidden);
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        list.open_editor(&todo(1));
        list.editor_draft_mut().unwrap().title = "renamed".to_string();
        assert_eq!(list.submit_edit(), MutationOutcome::Failed("Forbidden".to_string()));

        let EditorState::Editing { draft, error, .. } = list.editor() else {
            panic!("expected editing");
        };
        assert_eq!(draft.title, "renamed");
        assert_eq!(error.as_deref(), Some("Forbidden"));
        assert_eq!(list.version().get(), 1);
    }

    #[test]
    fn edit_success_closes_and_bumps_once() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new().ok(&created_body(1));
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        list.open_editor(&todo(1));
        assert_eq!(list.submit_edit(), MutationOutcome::Done);
        assert_eq!(list.editor(), &EditorState::Idle);
        assert_eq!(list.version().get(), 2);
        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert!(requests[0].path.ends_with("/todos/doc-1"));
    }

    #[test]
    fn submit_without_open_dialog_is_ignored() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new();
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        assert_eq!(list.submit_edit(), MutationOutcome::NotOpen);
        assert_eq!(list.submit_add(), MutationOutcome::NotOpen);
        assert_eq!(list.confirm_delete(), MutationOutcome::NotOpen);
    }

    #[test]
    fn delete_failure_returns_to_confirming() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new().status(404, "");
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        list.request_delete(&todo(4));
        assert!(matches!(list.confirm_delete(), MutationOutcome::Failed(_)));
        assert!(matches!(
            list.delete_dialog(),
            DeleteState::Confirming { error: Some(_), .. }
        ));
        list.cancel_delete();
        assert_eq!(list.delete_dialog(), &DeleteState::Idle);
    }

    #[test]
    fn delete_success_removes_item_after_refetch() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new()
            .ok(&me_body(&[1, 2]))
            .ok("{}")
            .ok(&me_body(&[1]));
        let store = session_store();
        let mut list = TodoList::with_query_options(&client, &transport, &store, NO_RETRY);

        list.load().unwrap();
        list.request_delete(&todo(2));
        assert_eq!(list.confirm_delete(), MutationOutcome::Done);
        let ListView::Ready { rows, .. } = list.load().unwrap() else {
            panic!("expected rows");
        };
        assert!(rows.iter().all(|t| t.document_id != "doc-2"));
    }

    #[test]
    fn generate_sends_sequential_creates_and_ignores_failures() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new()
            .status(201, &created_body(1))
            .status(500, "boom")
            .status(201, &created_body(3));
        let store = session_store();
        let mut list = TodoList::new(&client, &transport, &store);

        assert_eq!(list.generate(3), 2);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        for req in &requests {
            assert_eq!(req.method, HttpMethod::Post);
            let body: serde_json::Value =
                serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            let title = body["data"]["title"].as_str().unwrap();
            assert_eq!(title.split(' ').count(), 5);
        }
        assert_eq!(list.version().get(), 2);
    }

    #[test]
    fn generate_without_creations_keeps_version() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new()
            .ok(&me_body(&[1]))
            .status(500, "boom")
            .unreachable();
        let store = session_store();
        let mut list = TodoList::with_query_options(&client, &transport, &store, NO_RETRY);

        list.load().unwrap();
        assert_eq!(list.generate(0), 0);
        assert_eq!(list.generate(2), 0);
        assert_eq!(list.version().get(), 1);

        list.load().unwrap();
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn rejected_load_reports_error_instead_of_empty_list() {
        let client = ApiClient::new("http://api");
        let transport = ScriptedTransport::new().status(
            401,
            r#"{"data":null,"error":{"status":401,"name":"UnauthorizedError","message":"Missing or invalid credentials","details":{}}}"#,
        );
        let store = session_store();
        let mut list = TodoList::with_query_options(&client, &transport, &store, NO_RETRY);

        let view = list.load().unwrap();
        assert_eq!(
            view,
            ListView::Ready {
                rows: Vec::new(),
                is_fetching: false,
                error: Some("HTTP 401 UnauthorizedError: Missing or invalid credentials".to_string()),
            }
        );
    }

    #[test]
    fn generated_description_has_two_sentences() {
        let mut rng = rand::thread_rng();
        let draft = generated_draft(&mut rng);
        assert_eq!(draft.description.matches('.').count(), 2);
        assert!(draft.description.chars().next().unwrap().is_ascii_uppercase());
    }
}
