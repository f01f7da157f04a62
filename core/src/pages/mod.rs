//! Page controllers: the state and actions behind each screen, with the
//! rendering left to the host.

pub mod auth;
pub mod todo_list;
pub mod todos;

pub use auth::{LoginForm, RegisterForm, SubmitOutcome};
pub use todo_list::{AddState, DeleteState, EditorState, ListView, MutationOutcome, TodoList};
pub use todos::{TodoRow, TodosPage, TodosPageConfig, TodosView};
