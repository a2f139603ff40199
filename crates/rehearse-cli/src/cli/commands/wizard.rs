//! Session setup: choose a persona, customize, confirm.

use anyhow::{Context, Result, bail};
use rehearse_core::BackendApi;
use rehearse_core::runtime::WorkflowRuntime;
use rehearse_core::workflow::view::WizardView;
use rehearse_core::workflow::{Screen, ScreenView, WizardEvent, WizardStep, WorkflowEvent, project};

use super::catalog::persona_table;
use super::chat::converse;
use super::{ensure_signed_in, open_screen};
use crate::cli::terminal::{Input, TerminalView};

pub struct SetupOptions {
    pub persona: Option<String>,
    pub prompt: Option<String>,
    /// Skip the confirmation question.
    pub confirmed: bool,
    pub open_chat: bool,
}

fn wizard_view(runtime: &WorkflowRuntime) -> Result<WizardView> {
    match project(runtime.state()).body {
        ScreenView::Wizard(view) => Ok(view),
        _ => bail!("Session setup was interrupted."),
    }
}

fn wizard(runtime: &mut WorkflowRuntime, event: WizardEvent) {
    runtime.dispatch(WorkflowEvent::Wizard(event));
}

pub async fn run(api: &BackendApi, input: &mut Input, options: SetupOptions) -> Result<()> {
    let mut runtime = open_screen(api, "/session/new", Box::new(TerminalView::default())).await?;

    let view = wizard_view(&runtime)?;
    if let Some(error) = view.personas.error {
        bail!("{error}");
    }
    if view.personas.items.is_empty() {
        bail!("No personas are available right now.");
    }

    // Step 1
    let persona = match options.persona {
        Some(persona) => persona,
        None => {
            println!("{}", persona_table(&view.personas.items));
            input
                .ask("Persona ID: ")
                .await?
                .filter(|id| !id.is_empty())
                .context("no persona selected")?
        }
    };
    wizard(&mut runtime, WizardEvent::SelectPersona(persona.clone()));
    wizard(&mut runtime, WizardEvent::Next);
    if runtime.state().wizard.step != WizardStep::Customize {
        bail!("Unknown or inactive persona '{persona}'.");
    }

    // Step 2
    let prompt = match options.prompt {
        Some(prompt) => prompt,
        None => input
            .ask("Extra instructions for the persona (optional): ")
            .await?
            .unwrap_or_default(),
    };
    wizard(&mut runtime, WizardEvent::EditPrompt(prompt));
    wizard(&mut runtime, WizardEvent::Next);

    // Step 3
    if let Some(summary) = runtime.state().wizard.summary() {
        println!("Persona:      {}", summary.persona_name);
        println!("Difficulty:   {}", summary.difficulty.label());
        println!("Personality:  {}", summary.personality.label());
        if !summary.custom_prompt.is_empty() {
            println!("Instructions: {}", summary.custom_prompt);
        }
    }
    if !options.confirmed {
        let answer = input.ask("Start this session? [Y/n] ").await?.unwrap_or_default();
        if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    wizard(&mut runtime, WizardEvent::Confirm);
    runtime.settle().await;
    ensure_signed_in(&runtime)?;

    if !runtime.state().is_on(Screen::Chat) {
        let error = runtime.state().wizard.error.clone();
        bail!(error.unwrap_or_else(|| "Could not create the session.".to_string()));
    }
    let session_id = runtime.state().chat.session_id.clone().unwrap_or_default();
    println!("Session {session_id} created.");

    if !options.open_chat {
        println!("Continue it with `rehearse chat {session_id}`.");
        return Ok(());
    }
    converse(&mut runtime, input).await
}
