//! Session workflow: a pure reducer over [`AppState`].
//!
//! Screens (login, dashboard, setup wizard, chat, history) are features of
//! one state tree. Events come from the host and from completed effects; the
//! reducer mutates state and returns effects; the runtime executes them.

mod account;
pub mod chat;
mod dashboard;
pub mod effects;
pub mod events;
pub mod state;
mod update;
pub mod view;
pub mod wizard;

pub use chat::{ChatPhase, ChatState, Delivery, EndState, TranscriptEntry};
pub use effects::WorkflowEffect;
pub use events::{AuthEvent, ChatEvent, DashboardEvent, WizardEvent, WorkflowEvent};
pub use state::{AppState, AuthFormState, DashboardState, Loadable, Screen};
pub use update::update;
pub use view::{ScreenView, ViewBinding, ViewSnapshot, project};
pub use wizard::{WizardState, WizardStep, WizardSummary};
