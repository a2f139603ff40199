//! Three-step session setup: persona choice, customization, confirmation.

use rehearse_types::{CreateSessionRequest, Difficulty, Persona, Personality, Session};

use super::effects::WorkflowEffect;
use super::events::WizardEvent;
use super::state::Loadable;
use crate::gateway::ApiResult;
use crate::router::DASHBOARD_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WizardStep {
    #[default]
    Persona,
    Customize,
    Confirm,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Persona => 1,
            WizardStep::Customize => 2,
            WizardStep::Confirm => 3,
        }
    }

    fn forward(self) -> Self {
        match self {
            WizardStep::Persona => WizardStep::Customize,
            WizardStep::Customize | WizardStep::Confirm => WizardStep::Confirm,
        }
    }

    fn backward(self) -> Option<Self> {
        match self {
            WizardStep::Persona => None,
            WizardStep::Customize => Some(WizardStep::Persona),
            WizardStep::Confirm => Some(WizardStep::Customize),
        }
    }
}

/// What `back()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Stepped,
    /// Back from the first step leaves the wizard.
    Exit,
    Ignored,
}

/// Step 3 summary of what will be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSummary {
    pub persona_name: String,
    pub difficulty: Difficulty,
    pub personality: Personality,
    pub custom_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    pub step: WizardStep,
    pub personas: Loadable<Vec<Persona>>,
    pub selected: Option<String>,
    /// Prompt text as currently authored on step 2.
    pub prompt_draft: String,
    /// Prompt captured when leaving step 2; this is what gets sent.
    pub custom_prompt: String,
    /// Creation request in flight; confirm is disabled.
    pub creating: bool,
    pub error: Option<String>,
    /// Id of the created session once confirmation succeeded.
    pub created: Option<String>,
    run: u64,
}

impl WizardState {
    /// Starts a fresh run, discarding everything from earlier runs.
    ///
    /// Results tagged with an older run are ignored afterwards.
    pub fn reset(&mut self) -> u64 {
        let run = self.run.wrapping_add(1);
        *self = Self {
            run,
            personas: Loadable::Loading,
            ..Self::default()
        };
        run
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Retires the current run when the wizard screen is left, so results
    /// still in flight are ignored.
    pub fn leave(&mut self) {
        self.run = self.run.wrapping_add(1);
        self.creating = false;
    }

    /// Personas that can be chosen.
    pub fn available_personas(&self) -> impl Iterator<Item = &Persona> {
        self.personas
            .ready()
            .into_iter()
            .flatten()
            .filter(|persona| persona.is_active)
    }

    pub fn selected_persona(&self) -> Option<&Persona> {
        let id = self.selected.as_deref()?;
        self.available_personas().find(|persona| persona.id == id)
    }

    pub fn personas_loaded(&mut self, run: u64, result: ApiResult<Vec<Persona>>) {
        if run != self.run {
            return;
        }
        self.personas = match result {
            Ok(personas) => Loadable::Ready(personas),
            Err(err) => Loadable::Failed(err.display_message()),
        };
    }

    /// Selects a persona on step 1. Unknown or inactive ids are ignored.
    pub fn select_persona(&mut self, id: &str) -> bool {
        if self.step != WizardStep::Persona || self.creating {
            return false;
        }
        if !self.available_personas().any(|persona| persona.id == id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn edit_prompt(&mut self, text: String) {
        if self.step == WizardStep::Customize {
            self.prompt_draft = text;
        }
    }

    /// Advances one step. Step 1 requires a selection; leaving step 2
    /// snapshots the authored prompt.
    pub fn next(&mut self) -> bool {
        match self.step {
            WizardStep::Persona if self.selected.is_none() => false,
            WizardStep::Confirm => false,
            WizardStep::Customize => {
                self.custom_prompt.clone_from(&self.prompt_draft);
                self.step = self.step.forward();
                true
            }
            WizardStep::Persona => {
                self.step = self.step.forward();
                true
            }
        }
    }

    pub fn back(&mut self) -> BackOutcome {
        if self.creating {
            return BackOutcome::Ignored;
        }
        match self.step.backward() {
            Some(step) => {
                self.step = step;
                self.error = None;
                BackOutcome::Stepped
            }
            None => BackOutcome::Exit,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.step == WizardStep::Confirm && !self.creating && self.selected.is_some()
    }

    /// Marks creation in flight and returns the request to issue.
    pub fn begin_confirm(&mut self) -> Option<CreateSessionRequest> {
        if !self.can_confirm() {
            return None;
        }
        let persona = self.selected.clone()?;
        self.creating = true;
        self.error = None;
        Some(CreateSessionRequest::chat(persona, &self.custom_prompt))
    }

    /// Applies the creation result. Returns the new session id on success.
    ///
    /// A failure keeps step 3 and its data so the user can retry.
    pub fn finish_confirm(&mut self, run: u64, result: ApiResult<Session>) -> Option<String> {
        if run != self.run || !self.creating {
            return None;
        }
        self.creating = false;
        match result {
            Ok(session) => {
                self.created = Some(session.id.clone());
                Some(session.id)
            }
            Err(err) => {
                self.error = Some(err.display_message());
                None
            }
        }
    }

    pub fn summary(&self) -> Option<WizardSummary> {
        if self.step != WizardStep::Confirm {
            return None;
        }
        let persona = self.selected_persona()?;
        Some(WizardSummary {
            persona_name: persona.name.clone(),
            difficulty: persona.difficulty,
            personality: persona.personality,
            custom_prompt: self.custom_prompt.trim().to_string(),
        })
    }
}

pub(super) fn update(wizard: &mut WizardState, event: WizardEvent) -> Vec<WorkflowEffect> {
    match event {
        WizardEvent::PersonasLoaded { run, result } => {
            wizard.personas_loaded(run, result);
            vec![]
        }
        WizardEvent::SelectPersona(id) => {
            wizard.select_persona(&id);
            vec![]
        }
        WizardEvent::EditPrompt(text) => {
            wizard.edit_prompt(text);
            vec![]
        }
        WizardEvent::Next => {
            wizard.next();
            vec![]
        }
        WizardEvent::Back => match wizard.back() {
            BackOutcome::Exit => vec![WorkflowEffect::navigate(DASHBOARD_PATH)],
            BackOutcome::Stepped | BackOutcome::Ignored => vec![],
        },
        WizardEvent::Confirm => match wizard.begin_confirm() {
            Some(request) => vec![WorkflowEffect::CreateSession {
                run: wizard.run(),
                request,
            }],
            None => vec![],
        },
        WizardEvent::Created { run, result } => match wizard.finish_confirm(run, result) {
            Some(session_id) => vec![WorkflowEffect::navigate(format!("/session/{session_id}"))],
            None => vec![],
        },
    }
}
