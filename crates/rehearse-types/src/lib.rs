//! Wire and data model types shared by the rehearse client crates.

pub mod auth;
pub mod listing;
pub mod message;
pub mod persona;
pub mod session;
pub mod user;

mod id;

pub use auth::{AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest};
pub use listing::Listing;
pub use message::{AddMessageReply, AddMessageRequest, Message, MessageType, Role};
pub use persona::{Difficulty, Persona, Personality};
pub use session::{
    CreateSessionRequest, EndSessionRequest, PersonaRef, Session, SessionMode, SessionStatus,
};
pub use user::UserProfile;
