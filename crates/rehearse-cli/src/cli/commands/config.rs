//! Config command handlers.

use anyhow::{Context, Result};
use rehearse_core::config::{self, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    config::Config::init(&config_path).context("init config")?;
    println!("Created config at {}", config_path.display());
    Ok(())
}
