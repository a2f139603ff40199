//! Account command handlers.

use anyhow::{Context, Result, bail};
use rehearse_core::BackendApi;
use rehearse_types::RegisterRequest;

use super::api_failure;
use crate::cli::terminal::Input;

async fn read_password(input: &mut Input, prompt: &str) -> Result<String> {
    let password = input
        .ask(prompt)
        .await?
        .context("no password given on stdin")?;
    if password.is_empty() {
        bail!("Password must not be empty.");
    }
    Ok(password)
}

pub async fn login(
    api: &BackendApi,
    input: &mut Input,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password(input, "Password: ").await?,
    };

    let profile = api
        .login(email.trim(), &password)
        .await
        .map_err(|err| api_failure(&err))?;
    tracing::info!(user_id = %profile.id, "Logged in");
    println!("Logged in as {}", profile.display_name());
    Ok(())
}

pub async fn register(
    api: &BackendApi,
    input: &mut Input,
    email: String,
    username: String,
    password: Option<String>,
) -> Result<()> {
    let (password, password_confirm) = match password {
        Some(password) => (password.clone(), password),
        None => (
            read_password(input, "Password: ").await?,
            read_password(input, "Confirm password: ").await?,
        ),
    };
    if password != password_confirm {
        bail!("Passwords do not match.");
    }

    let request = RegisterRequest {
        email: email.trim().to_string(),
        username: username.trim().to_string(),
        password,
        password_confirm,
    };
    let profile = api
        .register(&request)
        .await
        .map_err(|err| api_failure(&err))?;
    tracing::info!(user_id = %profile.id, "Registered");
    println!("Welcome, {}! You are logged in.", profile.display_name());
    Ok(())
}

pub async fn logout(api: &BackendApi) -> Result<()> {
    if !api.store().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    api.logout().await;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(api: &BackendApi) {
    match api.store().profile() {
        Some(profile) if api.store().is_authenticated() => {
            println!("{} <{}>", profile.display_name(), profile.email);
        }
        _ => println!("Not logged in."),
    }
}
