//! Read-only listings: dashboard, personas, session history.

use anyhow::{Result, bail};
use comfy_table::{Table, presets};
use rehearse_core::BackendApi;
use rehearse_core::workflow::view::{ListView, PersonaRow, SessionRow};
use rehearse_core::workflow::{ScreenView, project};

use super::open_screen;

fn table(header: [&str; 5]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY).set_header(header);
    table
}

pub(crate) fn persona_table(rows: &[PersonaRow]) -> Table {
    let mut table = table(["ID", "NAME", "DIFFICULTY", "PERSONALITY", "DESCRIPTION"]);
    for row in rows {
        table.add_row([
            row.id.clone(),
            row.name.clone(),
            row.difficulty.label().to_string(),
            row.personality.label().to_string(),
            row.description.clone(),
        ]);
    }
    table
}

fn session_table(rows: &[SessionRow]) -> Table {
    let mut table = table(["ID", "PERSONA", "STATUS", "MESSAGES", "RATING"]);
    for row in rows {
        table.add_row([
            row.id.clone(),
            row.persona.clone(),
            row.status.label().to_string(),
            row.messages.map_or_else(|| "-".to_string(), |n| n.to_string()),
            row.rating.map_or_else(|| "-".to_string(), |n| n.to_string()),
        ]);
    }
    table
}

fn print_list<T>(list: &ListView<T>, empty: &str, render: impl Fn(&[T]) -> Table) -> Result<()> {
    if let Some(error) = &list.error {
        bail!("{error}");
    }
    if list.items.is_empty() {
        println!("{empty}");
    } else {
        println!("{}", render(list.items.as_slice()));
    }
    Ok(())
}

pub async fn dashboard(api: &BackendApi) -> Result<()> {
    let runtime = open_screen(api, "/dashboard", Box::new(())).await?;
    let snapshot = project(runtime.state());
    let ScreenView::Dashboard(view) = snapshot.body else {
        bail!("Dashboard did not load.");
    };

    if let Some(user) = &snapshot.user {
        println!("Welcome back, {user}.");
    }
    println!("Active sessions: {}", view.active_sessions);
    println!();
    println!("Personas");
    print_list(&view.personas, "No personas available.", persona_table)?;
    println!();
    println!("Sessions");
    print_list(&view.sessions, "No sessions yet. Start one with `rehearse new`.", session_table)
}

pub async fn personas(api: &BackendApi) -> Result<()> {
    let runtime = open_screen(api, "/dashboard", Box::new(())).await?;
    let ScreenView::Dashboard(view) = project(runtime.state()).body else {
        bail!("Personas did not load.");
    };
    print_list(&view.personas, "No personas available.", persona_table)
}

pub async fn history(api: &BackendApi) -> Result<()> {
    let runtime = open_screen(api, "/history", Box::new(())).await?;
    let ScreenView::History(sessions) = project(runtime.state()).body else {
        bail!("History did not load.");
    };
    print_list(&sessions, "No sessions yet. Start one with `rehearse new`.", session_table)
}
