//! Pure projection of [`AppState`] for front ends.

use rehearse_types::{Difficulty, Personality, Role, SessionStatus};

use super::chat::{ChatPhase, Delivery, EndState};
use super::state::{AppState, Loadable, Screen};
use super::wizard::WizardSummary;

/// Receives a fresh snapshot after every processed event.
pub trait ViewBinding {
    fn render(&mut self, view: &ViewSnapshot);
}

impl ViewBinding for () {
    fn render(&mut self, _view: &ViewSnapshot) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub screen: Option<Screen>,
    /// Display name of the logged-in user.
    pub user: Option<String>,
    pub notice: Option<String>,
    pub body: ScreenView,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    Blank,
    Auth(AuthView),
    Dashboard(DashboardView),
    History(ListView<SessionRow>),
    Wizard(WizardView),
    Chat(ChatView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthView {
    pub register: bool,
    pub submit_enabled: bool,
    pub error: Option<String>,
    pub field_errors: Vec<(String, String)>,
}

/// A list that may still be loading or may have failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub personality: Personality,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: String,
    pub persona: String,
    pub status: SessionStatus,
    pub rating: Option<u32>,
    pub messages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub personas: ListView<PersonaRow>,
    pub sessions: ListView<SessionRow>,
    pub active_sessions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardView {
    pub step: u8,
    pub personas: ListView<PersonaRow>,
    pub prompt: String,
    pub summary: Option<WizardSummary>,
    pub can_advance: bool,
    pub confirm_enabled: bool,
    pub creating: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub role: Role,
    pub content: String,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub session_id: Option<String>,
    pub title: Option<String>,
    pub status: Option<SessionStatus>,
    pub loading: bool,
    pub lines: Vec<ChatLine>,
    pub phase: ChatPhase,
    pub composing: bool,
    pub input_enabled: bool,
    pub confirming_end: bool,
    pub ending: bool,
    pub notice: Option<String>,
}

impl<T> ListView<T> {
    fn from_loadable<S>(loadable: &Loadable<Vec<S>>, row: impl Fn(&S) -> Option<T>) -> Self {
        Self {
            loading: loadable.is_loading(),
            error: loadable.error().map(str::to_string),
            items: loadable
                .ready()
                .map(|items| items.iter().filter_map(row).collect())
                .unwrap_or_default(),
        }
    }
}

pub fn project(app: &AppState) -> ViewSnapshot {
    let body = match app.screen {
        None => ScreenView::Blank,
        Some(screen @ (Screen::Login | Screen::Register)) => ScreenView::Auth(AuthView {
            register: screen == Screen::Register,
            submit_enabled: !app.auth.submitting,
            error: app.auth.error.clone(),
            field_errors: app.auth.field_errors.clone(),
        }),
        Some(Screen::Dashboard) => ScreenView::Dashboard(DashboardView {
            personas: ListView::from_loadable(&app.dashboard.personas, |p| {
                p.is_active.then(|| persona_row(p, false))
            }),
            sessions: ListView::from_loadable(&app.dashboard.sessions, |s| Some(session_row(s))),
            active_sessions: app.dashboard.active_sessions(),
        }),
        Some(Screen::History) => ScreenView::History(ListView::from_loadable(
            &app.dashboard.sessions,
            |s| Some(session_row(s)),
        )),
        Some(Screen::SetupWizard) => ScreenView::Wizard(project_wizard(app)),
        Some(Screen::Chat) => ScreenView::Chat(project_chat(app)),
    };

    ViewSnapshot {
        screen: app.screen,
        user: app.profile.as_ref().map(rehearse_types::UserProfile::display_name),
        notice: app.notice.clone(),
        body,
    }
}

fn persona_row(persona: &rehearse_types::Persona, selected: bool) -> PersonaRow {
    PersonaRow {
        id: persona.id.clone(),
        name: persona.name.clone(),
        description: persona.description.clone(),
        difficulty: persona.difficulty,
        personality: persona.personality,
        selected,
    }
}

fn session_row(session: &rehearse_types::Session) -> SessionRow {
    SessionRow {
        id: session.id.clone(),
        persona: session.persona_label().to_string(),
        status: session.status,
        rating: session.rating,
        messages: session.total_messages,
    }
}

fn project_wizard(app: &AppState) -> WizardView {
    let wizard = &app.wizard;
    let selected = wizard.selected.as_deref();
    WizardView {
        step: wizard.step.number(),
        personas: ListView::from_loadable(&wizard.personas, |p| {
            p.is_active
                .then(|| persona_row(p, Some(p.id.as_str()) == selected))
        }),
        prompt: wizard.prompt_draft.clone(),
        summary: wizard.summary(),
        can_advance: wizard.selected.is_some(),
        confirm_enabled: wizard.can_confirm(),
        creating: wizard.creating,
        error: wizard.error.clone(),
    }
}

fn project_chat(app: &AppState) -> ChatView {
    let chat = &app.chat;
    let session = chat.session.ready();
    ChatView {
        session_id: chat.session_id.clone(),
        title: session.map(|s| s.title.clone().unwrap_or_else(|| s.persona_label().to_string())),
        status: session.map(|s| s.status),
        loading: chat.session.is_loading(),
        lines: chat
            .transcript
            .iter()
            .map(|entry| ChatLine {
                role: entry.message.role,
                content: entry.message.content.clone(),
                delivery: entry.delivery,
            })
            .collect(),
        phase: chat.phase,
        composing: chat.composing,
        input_enabled: chat.input_enabled(),
        confirming_end: chat.end == EndState::Confirming,
        ending: chat.end == EndState::Ending,
        notice: chat.notice.clone(),
    }
}
