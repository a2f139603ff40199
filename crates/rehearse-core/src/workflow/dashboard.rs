//! Dashboard and session history.

use super::events::DashboardEvent;
use super::state::{AppState, DashboardState, Loadable, Screen};
use crate::gateway::ApiResult;

impl DashboardState {
    pub(super) fn begin_dashboard(&mut self) {
        self.personas = Loadable::Loading;
        self.sessions = Loadable::Loading;
    }

    pub(super) fn begin_history(&mut self) {
        self.sessions = Loadable::Loading;
    }
}

fn settle<T>(result: ApiResult<T>) -> Loadable<T> {
    match result {
        Ok(value) => Loadable::Ready(value),
        Err(err) => Loadable::Failed(err.display_message()),
    }
}

pub(super) fn update(app: &mut AppState, event: DashboardEvent) {
    match event {
        DashboardEvent::Loaded { personas, sessions } => {
            if !app.is_on(Screen::Dashboard) {
                return;
            }
            app.dashboard.personas = settle(personas);
            app.dashboard.sessions = settle(sessions);
        }
        DashboardEvent::HistoryLoaded(sessions) => {
            if !app.is_on(Screen::History) {
                return;
            }
            app.dashboard.sessions = settle(sessions);
        }
    }
}
