//! Live chat with a persona.
//!
//! Sends are strictly sequential: input is disabled from the moment a
//! message is submitted until its call settles. The user's message is shown
//! immediately and stays in the transcript whatever the outcome; its
//! delivery status says whether the backend acknowledged it.

use chrono::Utc;
use rehearse_types::{AddMessageReply, Message, MessageType, Role, Session, SessionStatus};

use super::effects::WorkflowEffect;
use super::events::ChatEvent;
use super::state::Loadable;
use crate::gateway::ApiResult;
use crate::router::DASHBOARD_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    Sending,
    AwaitingResponse,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub local_id: u64,
    pub message: Message,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndState {
    #[default]
    Closed,
    Confirming,
    Ending,
}

/// What a settled load means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Stale,
    /// The chat cannot be shown; leave with this message.
    Fatal(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Session this view is bound to; results for any other id are dropped.
    pub session_id: Option<String>,
    pub session: Loadable<Session>,
    pub transcript: Vec<TranscriptEntry>,
    pub phase: ChatPhase,
    /// Phases passed through since the last send started.
    pub phase_log: Vec<ChatPhase>,
    pub composing: bool,
    pub notice: Option<String>,
    pub end: EndState,
    in_flight: Option<u64>,
    next_local_id: u64,
}

impl ChatState {
    /// Binds the view to `session_id`, discarding everything else.
    pub fn enter(&mut self, session_id: &str) {
        let next_local_id = self.next_local_id;
        *self = Self {
            session_id: Some(session_id.to_string()),
            session: Loadable::Loading,
            next_local_id,
            ..Self::default()
        };
    }

    /// Unbinds the view so late results are dropped.
    pub fn leave(&mut self) {
        let next_local_id = self.next_local_id;
        *self = Self {
            next_local_id,
            ..Self::default()
        };
    }

    fn is_current(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }

    /// The bound session is loaded and still active.
    pub fn is_writable(&self) -> bool {
        self.session
            .ready()
            .is_some_and(|session| session.status.is_active())
    }

    pub fn input_enabled(&self) -> bool {
        self.is_writable() && self.phase == ChatPhase::Idle && self.end == EndState::Closed
    }

    pub fn loaded(
        &mut self,
        session_id: &str,
        result: ApiResult<(Session, Vec<Message>)>,
    ) -> LoadOutcome {
        if !self.is_current(session_id) || !self.session.is_loading() {
            return LoadOutcome::Stale;
        }
        match result {
            Ok((session, messages)) => {
                self.transcript = messages
                    .into_iter()
                    .filter(Message::is_visible)
                    .map(|message| TranscriptEntry {
                        local_id: self.allocate_id(),
                        message,
                        delivery: Delivery::Sent,
                    })
                    .collect();
                if !session.status.is_active() {
                    self.notice = Some(format!(
                        "This session is {} and can no longer be continued.",
                        session.status.label()
                    ));
                }
                self.session = Loadable::Ready(session);
                LoadOutcome::Ready
            }
            Err(err) => {
                let message = err.display_message();
                self.session = Loadable::Failed(message.clone());
                LoadOutcome::Fatal(message)
            }
        }
    }

    /// Appends the user's message optimistically and returns the send to issue.
    pub fn begin_send(&mut self, text: &str) -> Option<(String, u64, String)> {
        let content = text.trim();
        if content.is_empty() || !self.input_enabled() {
            return None;
        }
        let session_id = self.session_id.clone()?;

        let local_id = self.allocate_id();
        self.transcript.push(TranscriptEntry {
            local_id,
            message: Message {
                id: format!("local-{local_id}"),
                session: Some(session_id.clone()),
                role: Role::User,
                content: content.to_string(),
                message_type: MessageType::Text,
                created_at: Utc::now(),
            },
            delivery: Delivery::Pending,
        });
        self.notice = None;
        self.in_flight = Some(local_id);
        self.phase_log.clear();
        self.enter_phase(ChatPhase::Sending);
        self.enter_phase(ChatPhase::AwaitingResponse);
        self.composing = true;

        Some((session_id, local_id, content.to_string()))
    }

    /// Applies a send result. Returns false when the result was stale.
    pub fn complete_send(
        &mut self,
        session_id: &str,
        local_id: u64,
        result: ApiResult<AddMessageReply>,
    ) -> bool {
        if !self.is_current(session_id) || self.in_flight != Some(local_id) {
            return false;
        }
        self.in_flight = None;
        self.composing = false;

        let Some(index) = self
            .transcript
            .iter()
            .position(|entry| entry.local_id == local_id)
        else {
            self.enter_phase(ChatPhase::Idle);
            return true;
        };

        match result {
            Ok(reply) => {
                let entry = &mut self.transcript[index];
                entry.delivery = Delivery::Sent;
                if let Some(acknowledged) = reply.user_message {
                    entry.message = acknowledged;
                }
                if let Some(answer) = reply.assistant_message.filter(Message::is_visible) {
                    let local_id = self.allocate_id();
                    self.transcript.push(TranscriptEntry {
                        local_id,
                        message: answer,
                        delivery: Delivery::Sent,
                    });
                }
            }
            Err(err) => {
                self.transcript[index].delivery = Delivery::Failed;
                self.notice = Some(format!(
                    "Message not delivered: {}",
                    err.display_message()
                ));
                self.enter_phase(ChatPhase::Error);
            }
        }
        self.enter_phase(ChatPhase::Idle);
        true
    }

    pub fn request_end(&mut self) -> bool {
        if !self.is_writable() || self.end != EndState::Closed || self.phase != ChatPhase::Idle {
            return false;
        }
        self.end = EndState::Confirming;
        true
    }

    pub fn cancel_end(&mut self) {
        if self.end == EndState::Confirming {
            self.end = EndState::Closed;
        }
    }

    /// Returns the session to end when a confirmation was pending.
    pub fn confirm_end(&mut self) -> Option<String> {
        if self.end != EndState::Confirming {
            return None;
        }
        let session_id = self.session_id.clone()?;
        self.end = EndState::Ending;
        Some(session_id)
    }

    /// Applies the end result. Returns true when the session was ended.
    pub fn finish_end(&mut self, session_id: &str, result: ApiResult<()>) -> bool {
        if !self.is_current(session_id) || self.end != EndState::Ending {
            return false;
        }
        self.end = EndState::Closed;
        match result {
            Ok(()) => {
                if let Some(session) = self.session.ready_mut() {
                    session.status = SessionStatus::Completed;
                }
                true
            }
            Err(err) => {
                self.notice = Some(format!("Could not end session: {}", err.display_message()));
                false
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn enter_phase(&mut self, phase: ChatPhase) {
        self.phase = phase;
        self.phase_log.push(phase);
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_local_id += 1;
        self.next_local_id
    }
}

/// Chat reducer. A fatal load returns the notice for the app banner.
pub(super) fn update(chat: &mut ChatState, event: ChatEvent) -> (Vec<WorkflowEffect>, Option<String>) {
    match event {
        ChatEvent::Loaded { session_id, result } => match chat.loaded(&session_id, result) {
            LoadOutcome::Fatal(message) => {
                chat.leave();
                (vec![WorkflowEffect::navigate(DASHBOARD_PATH)], Some(message))
            }
            LoadOutcome::Ready | LoadOutcome::Stale => (vec![], None),
        },
        ChatEvent::Send { text } => match chat.begin_send(&text) {
            Some((session_id, local_id, content)) => (
                vec![WorkflowEffect::SendMessage {
                    session_id,
                    local_id,
                    content,
                }],
                None,
            ),
            None => (vec![], None),
        },
        ChatEvent::Sent {
            session_id,
            local_id,
            result,
        } => {
            if !chat.complete_send(&session_id, local_id, result) {
                tracing::debug!(session_id = %session_id, local_id, "Dropping stale send result");
            }
            (vec![], None)
        }
        ChatEvent::DismissNotice => {
            chat.dismiss_notice();
            (vec![], None)
        }
        ChatEvent::RequestEnd => {
            chat.request_end();
            (vec![], None)
        }
        ChatEvent::CancelEnd => {
            chat.cancel_end();
            (vec![], None)
        }
        ChatEvent::ConfirmEnd(request) => match chat.confirm_end() {
            Some(session_id) => (
                vec![WorkflowEffect::EndSession {
                    session_id,
                    request,
                }],
                None,
            ),
            None => (vec![], None),
        },
        ChatEvent::Ended { session_id, result } => {
            if chat.finish_end(&session_id, result) {
                (vec![WorkflowEffect::navigate(DASHBOARD_PATH)], None)
            } else {
                (vec![], None)
            }
        }
    }
}
