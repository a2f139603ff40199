//! CLI command handlers.

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod wizard;

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use rehearse_core::router::{HistoryNavigator, Navigator};
use rehearse_core::runtime::WorkflowRuntime;
use rehearse_core::workflow::{Screen, ViewBinding};
use rehearse_core::{ApiError, BackendApi};

const NOT_LOGGED_IN: &str = "Not logged in. Run `rehearse login` first.";

/// Converts a backend failure into a user-facing error.
pub(crate) fn api_failure(err: &ApiError) -> anyhow::Error {
    if err.is_auth() {
        return anyhow!("Your session has expired. Run `rehearse login` to sign in again.");
    }
    let fields = err.field_errors();
    if fields.is_empty() {
        return anyhow!(err.display_message());
    }
    let details = fields
        .iter()
        .map(|(field, message)| format!("  {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n");
    anyhow!("{}\n{details}", err.display_message())
}

/// Starts a workflow runtime at `path` and waits for its first load.
pub(crate) async fn open_screen(
    api: &BackendApi,
    path: &str,
    view: Box<dyn ViewBinding>,
) -> Result<WorkflowRuntime> {
    let navigator: Arc<dyn Navigator> = Arc::new(HistoryNavigator::new(path));
    let mut runtime = WorkflowRuntime::new(api.clone(), navigator, view);
    runtime.start();
    runtime.settle().await;
    ensure_signed_in(&runtime)?;
    Ok(runtime)
}

/// Fails when the guard or an expired session sent the user to login.
pub(crate) fn ensure_signed_in(runtime: &WorkflowRuntime) -> Result<()> {
    let state = runtime.state();
    if state.is_on(Screen::Login) || state.is_on(Screen::Register) {
        match &state.notice {
            Some(notice) => bail!("{notice}"),
            None => bail!(NOT_LOGGED_IN),
        }
    }
    Ok(())
}
