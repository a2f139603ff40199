//! Effect handlers.
//!
//! Handlers are pure async functions that perform one backend call and
//! return the resulting event. The runtime spawns them and sends the event
//! to its inbox; they never touch state.

use rehearse_types::{CreateSessionRequest, EndSessionRequest, RegisterRequest};

use crate::api::BackendApi;
use crate::workflow::{AuthEvent, ChatEvent, DashboardEvent, WizardEvent, WorkflowEvent};

pub async fn login(api: BackendApi, email: String, password: String) -> WorkflowEvent {
    WorkflowEvent::Auth(AuthEvent::Finished(api.login(&email, &password).await))
}

pub async fn register(api: BackendApi, request: RegisterRequest) -> WorkflowEvent {
    WorkflowEvent::Auth(AuthEvent::Finished(api.register(&request).await))
}

pub async fn logout(api: BackendApi) -> WorkflowEvent {
    api.logout().await;
    WorkflowEvent::Auth(AuthEvent::LoggedOut)
}

pub async fn load_dashboard(api: BackendApi) -> WorkflowEvent {
    let (personas, sessions) = tokio::join!(api.list_personas(), api.list_sessions());
    WorkflowEvent::Dashboard(DashboardEvent::Loaded { personas, sessions })
}

pub async fn load_history(api: BackendApi) -> WorkflowEvent {
    WorkflowEvent::Dashboard(DashboardEvent::HistoryLoaded(api.list_sessions().await))
}

pub async fn load_wizard_personas(api: BackendApi, run: u64) -> WorkflowEvent {
    let result = api.list_personas().await;
    WorkflowEvent::Wizard(WizardEvent::PersonasLoaded { run, result })
}

pub async fn create_session(
    api: BackendApi,
    run: u64,
    request: CreateSessionRequest,
) -> WorkflowEvent {
    let result = api.create_session(&request).await;
    if let Ok(session) = &result {
        tracing::info!(session_id = %session.id, persona = %request.persona, "Session created");
    }
    WorkflowEvent::Wizard(WizardEvent::Created { run, result })
}

/// Loads session detail and messages together; both must succeed.
pub async fn load_chat(api: BackendApi, session_id: String) -> WorkflowEvent {
    let (session, messages) = tokio::join!(
        api.get_session(&session_id),
        api.list_messages(&session_id)
    );
    let result = session.and_then(|session| messages.map(|messages| (session, messages)));
    WorkflowEvent::Chat(ChatEvent::Loaded { session_id, result })
}

pub async fn send_message(
    api: BackendApi,
    session_id: String,
    local_id: u64,
    content: String,
) -> WorkflowEvent {
    let result = api.add_message(&session_id, &content).await;
    WorkflowEvent::Chat(ChatEvent::Sent {
        session_id,
        local_id,
        result,
    })
}

pub async fn end_session(
    api: BackendApi,
    session_id: String,
    request: EndSessionRequest,
) -> WorkflowEvent {
    let result = api.end_session(&session_id, &request).await;
    if result.is_ok() {
        tracing::info!(session_id = %session_id, "Session ended");
    }
    WorkflowEvent::Chat(ChatEvent::Ended { session_id, result })
}
