//! Workflow reducer.
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use super::effects::WorkflowEffect;
use super::events::{ChatEvent, WorkflowEvent};
use super::state::{AppState, Screen};
use super::{account, chat, dashboard, wizard};
use crate::router::{DASHBOARD_PATH, LOGIN_PATH, RouteParams};

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// The main reducer function.
///
/// Any backend call that failed with an auth error sends the user to the
/// login screen, replacing whatever navigation the feature asked for.
pub fn update(app: &mut AppState, event: WorkflowEvent) -> Vec<WorkflowEffect> {
    let auth_failed = event.api_error().is_some_and(|err| err.is_auth());

    let mut effects = match event {
        WorkflowEvent::Enter { screen, params } => enter(app, screen, params),
        WorkflowEvent::Auth(event) => account::update(app, event),
        WorkflowEvent::Dashboard(event) => {
            dashboard::update(app, event);
            vec![]
        }
        WorkflowEvent::Wizard(event) => wizard::update(&mut app.wizard, event),
        WorkflowEvent::Chat(event) => {
            if matches!(event, ChatEvent::Send { .. }) {
                app.notice = None;
            }
            let (effects, notice) = chat::update(&mut app.chat, event);
            if notice.is_some() {
                app.notice = notice;
            }
            effects
        }
        WorkflowEvent::DismissNotice => {
            app.notice = None;
            vec![]
        }
    };

    if auth_failed {
        tracing::info!("Backend rejected the session, returning to login");
        app.profile = None;
        app.notice = Some(SESSION_EXPIRED.to_string());
        effects.retain(|effect| !matches!(effect, WorkflowEffect::Navigate { .. }));
        effects.push(WorkflowEffect::navigate(LOGIN_PATH));
    }
    effects
}

/// Screen entry: resets the screen's state and requests its data.
fn enter(app: &mut AppState, screen: Screen, params: RouteParams) -> Vec<WorkflowEffect> {
    if screen != Screen::Chat {
        app.chat.leave();
    }
    if screen != Screen::SetupWizard {
        app.wizard.leave();
    }
    app.screen = Some(screen);

    let effects = match screen {
        Screen::Login | Screen::Register => {
            app.auth.reset();
            vec![]
        }
        Screen::Dashboard => {
            app.dashboard.begin_dashboard();
            vec![WorkflowEffect::LoadDashboard]
        }
        Screen::History => {
            app.dashboard.begin_history();
            vec![WorkflowEffect::LoadHistory]
        }
        Screen::SetupWizard => {
            let run = app.wizard.reset();
            vec![WorkflowEffect::LoadWizardPersonas { run }]
        }
        Screen::Chat => match params.get("id") {
            Some(session_id) => {
                app.chat.enter(session_id);
                vec![WorkflowEffect::LoadChat {
                    session_id: session_id.clone(),
                }]
            }
            None => {
                app.chat.leave();
                vec![WorkflowEffect::navigate(DASHBOARD_PATH)]
            }
        },
    };
    app.params = params;
    effects
}
