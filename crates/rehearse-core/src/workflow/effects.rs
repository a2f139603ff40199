//! Effects returned by the reducer for the runtime to execute.
//!
//! Every effect except `Navigate` is a backend call whose result comes back
//! as exactly one event.

use rehearse_types::{CreateSessionRequest, EndSessionRequest, RegisterRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEffect {
    /// Change the addressable path. Routing happens on the resulting change.
    Navigate { path: String },
    Login { email: String, password: String },
    Register { request: RegisterRequest },
    Logout,
    /// Persona catalogue and session list for the dashboard.
    LoadDashboard,
    LoadHistory,
    /// Persona catalogue for wizard run `run`.
    LoadWizardPersonas { run: u64 },
    CreateSession {
        run: u64,
        request: CreateSessionRequest,
    },
    /// Session detail plus messages.
    LoadChat { session_id: String },
    SendMessage {
        session_id: String,
        local_id: u64,
        content: String,
    },
    EndSession {
        session_id: String,
        request: EndSessionRequest,
    },
}

impl WorkflowEffect {
    pub fn navigate(path: impl Into<String>) -> Self {
        WorkflowEffect::Navigate { path: path.into() }
    }
}
