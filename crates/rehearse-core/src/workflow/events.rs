//! Events consumed by the workflow reducer.
//!
//! Host input (form submissions, button presses) and async effect results
//! share one enum so the reducer is the single place state changes.

use rehearse_types::{
    AddMessageReply, EndSessionRequest, Message, Persona, RegisterRequest, Session, UserProfile,
};

use super::state::Screen;
use crate::gateway::{ApiError, ApiResult};
use crate::router::RouteParams;

#[derive(Debug)]
pub enum WorkflowEvent {
    /// The router dispatched `screen` for the current path.
    Enter { screen: Screen, params: RouteParams },
    Auth(AuthEvent),
    Dashboard(DashboardEvent),
    Wizard(WizardEvent),
    Chat(ChatEvent),
    DismissNotice,
}

#[derive(Debug)]
pub enum AuthEvent {
    Login { email: String, password: String },
    Register(RegisterRequest),
    /// Result of a login or register call.
    Finished(ApiResult<UserProfile>),
    Logout,
    LoggedOut,
}

#[derive(Debug)]
pub enum DashboardEvent {
    Loaded {
        personas: ApiResult<Vec<Persona>>,
        sessions: ApiResult<Vec<Session>>,
    },
    HistoryLoaded(ApiResult<Vec<Session>>),
}

#[derive(Debug)]
pub enum WizardEvent {
    PersonasLoaded {
        run: u64,
        result: ApiResult<Vec<Persona>>,
    },
    SelectPersona(String),
    EditPrompt(String),
    Next,
    Back,
    Confirm,
    Created {
        run: u64,
        result: ApiResult<Session>,
    },
}

#[derive(Debug)]
pub enum ChatEvent {
    Loaded {
        session_id: String,
        result: ApiResult<(Session, Vec<Message>)>,
    },
    Send { text: String },
    Sent {
        session_id: String,
        local_id: u64,
        result: ApiResult<AddMessageReply>,
    },
    DismissNotice,
    RequestEnd,
    CancelEnd,
    /// Rating and feedback are sent along with the end request.
    ConfirmEnd(EndSessionRequest),
    Ended {
        session_id: String,
        result: ApiResult<()>,
    },
}

impl WorkflowEvent {
    /// The API error carried by an effect result, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            WorkflowEvent::Auth(AuthEvent::Finished(Err(err)))
            | WorkflowEvent::Dashboard(DashboardEvent::HistoryLoaded(Err(err)))
            | WorkflowEvent::Wizard(
                WizardEvent::PersonasLoaded { result: Err(err), .. }
                | WizardEvent::Created { result: Err(err), .. },
            )
            | WorkflowEvent::Chat(
                ChatEvent::Loaded { result: Err(err), .. }
                | ChatEvent::Sent { result: Err(err), .. }
                | ChatEvent::Ended { result: Err(err), .. },
            ) => Some(err),
            WorkflowEvent::Dashboard(DashboardEvent::Loaded { personas, sessions }) => {
                personas.as_ref().err().or(sessions.as_ref().err())
            }
            _ => None,
        }
    }
}
