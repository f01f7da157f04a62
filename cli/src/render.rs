//! Terminal rendering of page views and effects.

use todo_client::notify::{Toast, ToastKind};
use todo_client::pages::{ListView, TodosView};
use todo_client::validation::FieldErrors;

const SKELETON: &str = "  ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░    ░░░░  ░░░░";
const EMPTY: &str = "No Todos Yet!";

pub fn toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Success => println!("✔ {}", toast.message),
        ToastKind::Error => eprintln!("✘ {}", toast.message),
    }
}

pub fn field_errors(errors: &FieldErrors) {
    for e in errors.iter() {
        eprintln!("  {}: {}", e.field, e.message);
    }
}

pub fn skeleton(rows: usize) {
    for _ in 0..rows {
        println!("{SKELETON}");
    }
}

pub fn todo_list(view: &ListView) {
    match view {
        ListView::Loading { skeleton_rows } => skeleton(*skeleton_rows),
        ListView::Ready {
            rows,
            error: Some(error),
            ..
        } if rows.is_empty() => eprintln!("✘ {error}"),
        ListView::Ready { rows, .. } if rows.is_empty() => println!("{EMPTY}"),
        ListView::Ready { rows, .. } => {
            for todo in rows {
                println!("{}- {}  [{}]", todo.id, todo.title, todo.document_id);
            }
        }
    }
}

pub fn todos_page(view: &TodosView) {
    match view {
        TodosView::Loading { skeleton_rows } => skeleton(*skeleton_rows),
        TodosView::Ready {
            rows,
            paginator,
            error,
        } => {
            match error {
                Some(error) if rows.is_empty() => eprintln!("✘ {error}"),
                _ if rows.is_empty() => println!("{EMPTY}"),
                _ => {}
            }
            for row in rows {
                println!("{}", row.label());
            }
            if let Some(p) = paginator {
                let prev = if p.prev_disabled { " " } else { "<" };
                let next = if p.next_disabled { " " } else { ">" };
                println!(
                    "{prev} page {} of {} ({} records) {next}",
                    p.page, p.page_count, p.total
                );
            }
        }
    }
}
