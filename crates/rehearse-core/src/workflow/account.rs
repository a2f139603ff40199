//! Login, registration and logout.

use super::effects::WorkflowEffect;
use super::events::AuthEvent;
use super::state::AppState;
use crate::router::{DASHBOARD_PATH, LOGIN_PATH};

pub(super) fn update(app: &mut AppState, event: AuthEvent) -> Vec<WorkflowEffect> {
    let form = &mut app.auth;
    match event {
        AuthEvent::Login { email, password } => {
            let email = email.trim();
            if form.submitting || email.is_empty() || password.is_empty() {
                return vec![];
            }
            form.submitting = true;
            form.error = None;
            form.field_errors.clear();
            vec![WorkflowEffect::Login {
                email: email.to_string(),
                password,
            }]
        }
        AuthEvent::Register(mut request) => {
            if form.submitting {
                return vec![];
            }
            request.email = request.email.trim().to_string();
            request.username = request.username.trim().to_string();
            if request.email.is_empty() || request.username.is_empty() || request.password.is_empty()
            {
                form.error = Some("All fields are required.".to_string());
                return vec![];
            }
            if !request.passwords_match() {
                form.error = Some("Passwords do not match.".to_string());
                form.field_errors = vec![(
                    "password_confirm".to_string(),
                    "Passwords do not match.".to_string(),
                )];
                return vec![];
            }
            form.submitting = true;
            form.error = None;
            form.field_errors.clear();
            vec![WorkflowEffect::Register { request }]
        }
        AuthEvent::Finished(result) => {
            if !form.submitting {
                return vec![];
            }
            form.submitting = false;
            match result {
                Ok(profile) => {
                    app.profile = Some(profile);
                    vec![WorkflowEffect::navigate(DASHBOARD_PATH)]
                }
                Err(err) => {
                    form.error = Some(err.display_message());
                    form.field_errors = err.field_errors();
                    vec![]
                }
            }
        }
        AuthEvent::Logout => {
            if form.logging_out {
                return vec![];
            }
            form.logging_out = true;
            vec![WorkflowEffect::Logout]
        }
        AuthEvent::LoggedOut => {
            form.logging_out = false;
            app.profile = None;
            vec![WorkflowEffect::navigate(LOGIN_PATH)]
        }
    }
}

#[cfg(test)]
mod tests {
    use rehearse_types::{RegisterRequest, UserProfile};
    use serde_json::json;

    use super::*;
    use crate::gateway::ApiError;

    fn register(password_confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: " b@x.com ".into(),
            username: "bee".into(),
            password: "secret123".into(),
            password_confirm: password_confirm.into(),
        }
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut app = AppState::new();
        let effects = update(
            &mut app,
            AuthEvent::Login {
                email: "  ".into(),
                password: "pw".into(),
            },
        );
        assert!(effects.is_empty());
        assert!(!app.auth.submitting);
    }

    #[test]
    fn test_login_blocks_duplicate_submission() {
        let mut app = AppState::new();
        let login = || AuthEvent::Login {
            email: "a@x.com".into(),
            password: "pw".into(),
        };

        assert_eq!(update(&mut app, login()).len(), 1);
        assert!(update(&mut app, login()).is_empty());
    }

    #[test]
    fn test_login_success_navigates_to_dashboard() {
        let mut app = AppState::new();
        update(
            &mut app,
            AuthEvent::Login {
                email: "a@x.com".into(),
                password: "pw".into(),
            },
        );
        let effects = update(
            &mut app,
            AuthEvent::Finished(Ok(UserProfile {
                id: "1".into(),
                ..Default::default()
            })),
        );

        assert_eq!(effects, vec![WorkflowEffect::navigate("/dashboard")]);
        assert!(!app.auth.submitting);
        assert_eq!(app.profile.map(|p| p.id), Some("1".to_string()));
    }

    #[test]
    fn test_login_failure_shows_message_and_reenables() {
        let mut app = AppState::new();
        update(
            &mut app,
            AuthEvent::Login {
                email: "a@x.com".into(),
                password: "bad".into(),
            },
        );
        let effects = update(
            &mut app,
            AuthEvent::Finished(Err(ApiError::validation(
                401,
                json!({"detail": "No active account found with the given credentials"}),
            ))),
        );

        assert!(effects.is_empty());
        assert!(!app.auth.submitting);
        assert_eq!(
            app.auth.error.as_deref(),
            Some("No active account found with the given credentials")
        );
    }

    #[test]
    fn test_register_mismatch_is_local() {
        let mut app = AppState::new();
        let effects = update(&mut app, AuthEvent::Register(register("other")));

        assert!(effects.is_empty());
        assert_eq!(app.auth.error.as_deref(), Some("Passwords do not match."));
        assert!(!app.auth.submitting);
    }

    #[test]
    fn test_register_trims_and_submits() {
        let mut app = AppState::new();
        let effects = update(&mut app, AuthEvent::Register(register("secret123")));

        let [WorkflowEffect::Register { request }] = effects.as_slice() else {
            panic!("expected register effect, got {effects:?}");
        };
        assert_eq!(request.email, "b@x.com");
        assert!(app.auth.submitting);
    }

    #[test]
    fn test_logout_navigates_to_login() {
        let mut app = AppState::new();
        app.profile = Some(UserProfile::default());

        assert_eq!(update(&mut app, AuthEvent::Logout), vec![WorkflowEffect::Logout]);
        assert!(update(&mut app, AuthEvent::Logout).is_empty());

        let effects = update(&mut app, AuthEvent::LoggedOut);
        assert_eq!(effects, vec![WorkflowEffect::navigate("/login")]);
        assert!(app.profile.is_none());
    }
}
