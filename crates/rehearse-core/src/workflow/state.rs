//! Application state owned by the runtime and mutated only by the reducer.

use rehearse_types::{Persona, Session, UserProfile};

use super::chat::ChatState;
use super::wizard::WizardState;
use crate::router::RouteParams;

/// Top-level screens the router can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    SetupWizard,
    Chat,
    History,
}

impl Screen {
    /// Route patterns in registration order.
    pub const ROUTES: [(&'static str, Screen); 6] = [
        ("/login", Screen::Login),
        ("/register", Screen::Register),
        ("/dashboard", Screen::Dashboard),
        ("/session/new", Screen::SetupWizard),
        ("/session/:id", Screen::Chat),
        ("/history", Screen::History),
    ];
}

/// Data fetched for a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Idle
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Login/register form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormState {
    /// A login or register call is in flight; submit is disabled.
    pub submitting: bool,
    pub error: Option<String>,
    pub field_errors: Vec<(String, String)>,
    pub logging_out: bool,
}

impl AuthFormState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Dashboard and history data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub personas: Loadable<Vec<Persona>>,
    pub sessions: Loadable<Vec<Session>>,
}

impl DashboardState {
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .ready()
            .map_or(0, |sessions| sessions.iter().filter(|s| s.status.is_active()).count())
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub screen: Option<Screen>,
    pub params: RouteParams,
    pub profile: Option<UserProfile>,
    /// App-wide banner, e.g. why the user was sent back to the dashboard.
    pub notice: Option<String>,
    pub auth: AuthFormState,
    pub dashboard: DashboardState,
    pub wizard: WizardState,
    pub chat: ChatState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, screen: Screen) -> bool {
        self.screen == Some(screen)
    }
}
