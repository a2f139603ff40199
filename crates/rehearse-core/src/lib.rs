//! Core library for the rehearse client.
//!
//! Credential storage, the authenticated request gateway, route dispatch
//! with auth guards, and the wizard/chat workflow driven by an effect
//! runtime. Front ends plug in through [`router::Navigator`] and
//! [`workflow::ViewBinding`].

pub mod api;
pub mod auth;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod router;
pub mod runtime;
pub mod workflow;

pub use api::BackendApi;
pub use auth::AuthStore;
pub use gateway::{ApiError, ApiGateway};
