mod config;
mod render;
mod transport;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use todo_client::notify::Navigation;
use todo_client::pages::todo_list::DEFAULT_GENERATE_COUNT;
use todo_client::pages::{
    ListView, LoginForm, MutationOutcome, RegisterForm, SubmitOutcome, TodoList, TodosPage,
    TodosPageConfig,
};
use todo_client::{
    ApiClient, FileSessionStore, LoginInput, RegisterInput, SessionStore, SortDirection, Todo,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::transport::UreqTransport;

#[derive(Debug, Parser)]
#[command(name = "todo", about = "Manage your todos on a hosted content API")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session locally.
    Login {
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account; log in afterwards.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show your todos, newest first.
    List,
    /// Show one page of todos.
    Todos {
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long, default_value = "DESC")]
        sort: SortDirection,
        /// Hide sort and page-size controls.
        #[arg(long)]
        plain: bool,
    },
    /// Add a todo.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Edit a todo by its document id.
    Edit {
        document_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a todo by its document id.
    Remove { document_id: String },
    /// Create random todos.
    Generate {
        #[arg(long, default_value_t = DEFAULT_GENERATE_COUNT)]
        count: usize,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "todo_cli=info,todo_client=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn follow(navigation: &Navigation) {
    std::thread::sleep(navigation.after);
    let hint = match navigation.to.as_str() {
        "/login" => "run `todo login` to continue",
        _ => "run `todo list` to see your todos",
    };
    println!("→ {} ({hint})", navigation.to);
}

fn report(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Invalid(errors) => {
            render::field_errors(&errors);
            bail!("invalid input");
        }
        SubmitOutcome::Succeeded { toast, navigation } => {
            render::toast(&toast);
            follow(&navigation);
            Ok(())
        }
        SubmitOutcome::Failed { toast } => {
            if let Some(toast) = toast {
                render::toast(&toast);
            }
            bail!("request failed");
        }
    }
}

fn find(list: &mut TodoList<'_>, document_id: &str) -> Result<Todo> {
    match list.load()? {
        ListView::Ready {
            error: Some(error), ..
        } => bail!("could not load todos: {error}"),
        ListView::Ready { rows, .. } => rows
            .into_iter()
            .find(|t| t.document_id == document_id)
            .with_context(|| format!("no todo with document id {document_id}")),
        ListView::Loading { .. } => bail!("todo list did not load"),
    }
}

fn failed_load(error: Option<&str>) -> Result<()> {
    match error {
        Some(error) => bail!("could not load todos: {error}"),
        None => Ok(()),
    }
}

fn mutation(outcome: MutationOutcome) -> Result<()> {
    match outcome {
        MutationOutcome::Done => Ok(()),
        MutationOutcome::Failed(message) => bail!(message),
        MutationOutcome::NotOpen => bail!("no dialog open"),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let client = ApiClient::new(&cli.config.base_url);
    let transport = UreqTransport::new();
    let store = FileSessionStore::new(cli.config.session_path()?);
    info!(base_url = client.base_url(), session = %store.path().display(), "configured");

    match cli.command {
        Command::Login {
            identifier,
            password,
        } => {
            let input = LoginInput {
                identifier,
                password,
            };
            report(LoginForm::new().submit(&input, &client, &transport, &store))
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let input = RegisterInput {
                username,
                email,
                password,
            };
            report(RegisterForm::new().submit(&input, &client, &transport))
        }
        Command::Logout => {
            store.clear()?;
            println!("logged out");
            Ok(())
        }
        Command::List => {
            let mut list = TodoList::new(&client, &transport, &store);
            render::todo_list(&list.pending_view());
            let view = list.load()?;
            render::todo_list(&view);
            failed_load(view.error())
        }
        Command::Todos {
            page,
            page_size,
            sort,
            plain,
        } => {
            let config = TodosPageConfig {
                show_controls: !plain,
            };
            let mut todos = TodosPage::new(&client, &transport, &store, config);
            if page_size != 10 && !todos.set_page_size(page_size) {
                bail!("page size must be one of 10, 50, 100 (and not --plain)");
            }
            if sort != SortDirection::default() && !todos.set_sort(sort) {
                bail!("sorting is not available with --plain");
            }
            todos.go_to(page);
            render::todos_page(&todos.pending_view());
            let view = todos.load()?;
            render::todos_page(&view);
            failed_load(view.error())
        }
        Command::Add { title, description } => {
            let mut list = TodoList::new(&client, &transport, &store);
            list.open_add();
            if let Some(draft) = list.add_draft_mut() {
                draft.title = title;
                draft.description = description;
            }
            mutation(list.submit_add())?;
            render::todo_list(&list.load()?);
            Ok(())
        }
        Command::Edit {
            document_id,
            title,
            description,
        } => {
            let mut list = TodoList::new(&client, &transport, &store);
            let todo = find(&mut list, &document_id)?;
            list.open_editor(&todo);
            if let Some(draft) = list.editor_draft_mut() {
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
            }
            mutation(list.submit_edit())?;
            render::todo_list(&list.load()?);
            Ok(())
        }
        Command::Remove { document_id } => {
            let mut list = TodoList::new(&client, &transport, &store);
            let todo = find(&mut list, &document_id)?;
            list.request_delete(&todo);
            mutation(list.confirm_delete())?;
            render::todo_list(&list.load()?);
            Ok(())
        }
        Command::Generate { count } => {
            let mut list = TodoList::new(&client, &transport, &store);
            let created = list.generate(count);
            println!("generated {created} of {count} todos");
            render::todo_list(&list.load()?);
            Ok(())
        }
    }
}
