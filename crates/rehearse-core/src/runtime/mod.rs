//! Workflow runtime: routes path changes, runs the reducer, executes effects.
//!
//! This is the side-effect boundary. The reducer stays pure and produces
//! effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Backend effects are spawned as tasks whose single result event is sent to
//! `inbox_tx`. The controller loop selects over navigator path changes and
//! the inbox, feeding both into the reducer, and hands a fresh
//! [`ViewSnapshot`](crate::workflow::ViewSnapshot) to the view after each one.

pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::BackendApi;
use crate::router::{Navigator, PathChanges, Resolution, Router};
use crate::workflow::{self, AppState, Screen, ViewBinding, WorkflowEffect, WorkflowEvent};

/// Router with every app screen registered.
pub fn app_router() -> Router<Screen> {
    Screen::ROUTES
        .into_iter()
        .fold(Router::new(), |router, (pattern, screen)| {
            router.route(pattern, screen)
        })
}

pub struct WorkflowRuntime {
    api: BackendApi,
    navigator: Arc<dyn Navigator>,
    router: Router<Screen>,
    state: AppState,
    view: Box<dyn ViewBinding>,
    inbox_tx: mpsc::UnboundedSender<WorkflowEvent>,
    inbox_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
    path_changes: PathChanges,
    /// Spawned effects whose result event has not been processed yet.
    pending: usize,
}

impl WorkflowRuntime {
    pub fn new(api: BackendApi, navigator: Arc<dyn Navigator>, view: Box<dyn ViewBinding>) -> Self {
        let path_changes = navigator.subscribe();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let state = AppState {
            profile: api.store().profile(),
            ..AppState::default()
        };
        Self {
            api,
            navigator,
            router: app_router(),
            state,
            view,
            inbox_tx,
            inbox_rx,
            path_changes,
            pending: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    /// Spawned effects still outstanding.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Routes the initial path.
    pub fn start(&mut self) {
        let path = self.navigator.current_path();
        self.handle_path(&path);
    }

    /// Feeds a host event (user input) into the reducer.
    pub fn dispatch(&mut self, event: WorkflowEvent) {
        let effects = workflow::update(&mut self.state, event);
        self.view.render(&workflow::project(&self.state));
        for effect in effects {
            self.execute(effect);
        }
    }

    /// Processes the next path change or inbox event.
    pub async fn next(&mut self) {
        tokio::select! {
            biased;
            Some(path) = self.path_changes.recv() => self.handle_path(&path),
            Some(event) = self.inbox_rx.recv() => {
                self.pending = self.pending.saturating_sub(1);
                self.dispatch(event);
            }
            else => tracing::warn!("Runtime channels closed"),
        }
    }

    /// Processes events until every spawned effect has reported back and no
    /// navigation is queued.
    pub async fn settle(&mut self) {
        loop {
            while let Ok(path) = self.path_changes.try_recv() {
                self.handle_path(&path);
            }
            if self.pending == 0 {
                return;
            }
            self.next().await;
        }
    }

    /// Processes events until `done` holds for the state.
    pub async fn run_until(&mut self, mut done: impl FnMut(&AppState) -> bool) {
        while !done(&self.state) {
            self.next().await;
        }
    }

    fn handle_path(&mut self, path: &str) {
        let authenticated = self.api.store().is_authenticated();
        let event = match self.router.resolve(path, authenticated) {
            Resolution::Redirect(target) => {
                tracing::debug!(from = path, to = target, "Route guard redirect");
                self.navigator.set_path(target);
                return;
            }
            Resolution::Dispatch { handler, params } => WorkflowEvent::Enter {
                screen: *handler,
                params,
            },
        };
        tracing::debug!(path, "Route dispatch");
        if self.state.profile.is_none() {
            self.state.profile = self.api.store().profile();
        }
        self.dispatch(event);
    }

    fn execute(&mut self, effect: WorkflowEffect) {
        let api = self.api.clone();
        match effect {
            WorkflowEffect::Navigate { path } => self.navigator.set_path(&path),
            WorkflowEffect::Login { email, password } => {
                self.spawn_effect(handlers::login(api, email, password));
            }
            WorkflowEffect::Register { request } => {
                self.spawn_effect(handlers::register(api, request));
            }
            WorkflowEffect::Logout => self.spawn_effect(handlers::logout(api)),
            WorkflowEffect::LoadDashboard => self.spawn_effect(handlers::load_dashboard(api)),
            WorkflowEffect::LoadHistory => self.spawn_effect(handlers::load_history(api)),
            WorkflowEffect::LoadWizardPersonas { run } => {
                self.spawn_effect(handlers::load_wizard_personas(api, run));
            }
            WorkflowEffect::CreateSession { run, request } => {
                self.spawn_effect(handlers::create_session(api, run, request));
            }
            WorkflowEffect::LoadChat { session_id } => {
                self.spawn_effect(handlers::load_chat(api, session_id));
            }
            WorkflowEffect::SendMessage {
                session_id,
                local_id,
                content,
            } => self.spawn_effect(handlers::send_message(api, session_id, local_id, content)),
            WorkflowEffect::EndSession {
                session_id,
                request,
            } => {
                self.spawn_effect(handlers::end_session(api, session_id, request));
            }
        }
    }

    fn spawn_effect<Fut>(&mut self, task: Fut)
    where
        Fut: Future<Output = WorkflowEvent> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }
}
