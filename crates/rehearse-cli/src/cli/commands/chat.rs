//! Interactive chat with a persona.

use anyhow::{Result, bail};
use rehearse_core::BackendApi;
use rehearse_core::runtime::WorkflowRuntime;
use rehearse_core::workflow::{ChatEvent, EndState, Screen, WorkflowEvent};
use rehearse_types::EndSessionRequest;

use super::{ensure_signed_in, open_screen};
use crate::cli::terminal::{Input, TerminalView};

const HELP: &str = "Type a message and press Enter. /end [rating 1-5] finishes the session, \
                    /quit leaves it open.";

pub async fn run(api: &BackendApi, input: &mut Input, session_id: &str) -> Result<()> {
    let path = format!("/session/{session_id}");
    let mut runtime = open_screen(api, &path, Box::new(TerminalView::default())).await?;
    converse(&mut runtime, input).await
}

/// Runs the chat loop until the session ends, the user quits, or input closes.
pub(crate) async fn converse(runtime: &mut WorkflowRuntime, input: &mut Input) -> Result<()> {
    if !runtime.state().is_on(Screen::Chat) {
        match runtime.state().notice.clone() {
            Some(notice) => bail!("{notice}"),
            None => bail!("Could not open the session."),
        }
    }
    if runtime.state().chat.is_writable() {
        println!("{HELP}");
    } else {
        println!("This session is finished; the transcript is read-only.");
        return Ok(());
    }

    let mut ended = false;
    let mut closing = EndSessionRequest::default();
    while runtime.state().is_on(Screen::Chat) {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match handle_line(runtime, line.trim(), &mut closing) {
                    LineOutcome::Continue => {}
                    LineOutcome::Ending => ended = true,
                    LineOutcome::Quit => break,
                }
            }
            () = runtime.next() => {}
        }
    }
    // Let in-flight replies land before leaving.
    runtime.settle().await;

    ensure_signed_in(runtime)?;
    if ended && runtime.state().is_on(Screen::Dashboard) {
        println!("Session ended.");
    }
    Ok(())
}

enum LineOutcome {
    Continue,
    Ending,
    Quit,
}

/// `closing` carries the rating given with `/end` until the end is confirmed.
fn handle_line(
    runtime: &mut WorkflowRuntime,
    line: &str,
    closing: &mut EndSessionRequest,
) -> LineOutcome {
    if runtime.state().chat.end == EndState::Confirming {
        if line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes") {
            let request = std::mem::take(closing);
            runtime.dispatch(WorkflowEvent::Chat(ChatEvent::ConfirmEnd(request)));
            return LineOutcome::Ending;
        }
        runtime.dispatch(WorkflowEvent::Chat(ChatEvent::CancelEnd));
        return LineOutcome::Continue;
    }

    if let Some(rating) = line.strip_prefix("/end ") {
        match rating.trim().parse().ok().and_then(EndSessionRequest::rated) {
            Some(request) => {
                *closing = request;
                runtime.dispatch(WorkflowEvent::Chat(ChatEvent::RequestEnd));
            }
            None => println!("Rating must be a number from 1 to 5."),
        }
        return LineOutcome::Continue;
    }

    match line {
        "" => {}
        "/quit" => return LineOutcome::Quit,
        "/end" => {
            *closing = EndSessionRequest::default();
            runtime.dispatch(WorkflowEvent::Chat(ChatEvent::RequestEnd));
        }
        "/help" => println!("{HELP}"),
        text if !runtime.state().chat.input_enabled() => {
            tracing::debug!(len = text.len(), "Input ignored while busy");
            println!("Still waiting for a reply...");
        }
        text => {
            runtime.dispatch(WorkflowEvent::Chat(ChatEvent::Send {
                text: text.to_string(),
            }));
        }
    }
    LineOutcome::Continue
}
