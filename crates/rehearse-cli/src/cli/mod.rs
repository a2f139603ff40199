//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use rehearse_core::config::{self, paths};
use rehearse_core::{ApiGateway, AuthStore, BackendApi, logging};

mod commands;
mod terminal;

use terminal::Input;

#[derive(Parser)]
#[command(name = "rehearse")]
#[command(version)]
#[command(about = "Rehearse conversations with simulated personas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store credentials locally
    Login {
        #[arg(long, env = "REHEARSE_EMAIL")]
        email: String,

        /// Read from stdin when omitted
        #[arg(long, env = "REHEARSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(long, env = "REHEARSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log out and forget stored credentials
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show personas and recent sessions
    Dashboard,
    /// List available personas
    Personas,
    /// List past and active sessions
    #[command(alias = "sessions")]
    History,
    /// Set up a new practice session
    New {
        /// Persona ID (prompted when omitted)
        #[arg(long)]
        persona: Option<String>,

        /// Extra instructions for the persona (prompted when omitted)
        #[arg(long)]
        prompt: Option<String>,

        /// Create without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Create the session but do not start chatting
        #[arg(long = "no-chat")]
        no_chat: bool,
    },
    /// Continue a session
    Chat {
        /// Session ID
        session_id: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the config file path
    Path,
    /// Create a default config file
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log, &paths::logs_dir()).context("init logging")?;

    let store = AuthStore::file(paths::auth_path());
    let gateway = ApiGateway::from_config(&config.api, store).context("create API client")?;
    let api = BackendApi::new(gateway);
    tracing::debug!(base_url = %api.gateway().base_url(), "Client ready");

    let mut input = Input::stdin();

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&api, &mut input, &email, password).await
        }
        Commands::Register {
            email,
            username,
            password,
        } => commands::auth::register(&api, &mut input, email, username, password).await,
        Commands::Logout => commands::auth::logout(&api).await,
        Commands::Whoami => {
            commands::auth::whoami(&api);
            Ok(())
        }
        Commands::Dashboard => commands::catalog::dashboard(&api).await,
        Commands::Personas => commands::catalog::personas(&api).await,
        Commands::History => commands::catalog::history(&api).await,
        Commands::New {
            persona,
            prompt,
            yes,
            no_chat,
        } => {
            let options = commands::wizard::SetupOptions {
                persona,
                prompt,
                confirmed: yes,
                open_chat: !no_chat,
            };
            commands::wizard::run(&api, &mut input, options).await
        }
        Commands::Chat { session_id } => commands::chat::run(&api, &mut input, &session_id).await,
        Commands::Config { .. } => Ok(()),
    }
}
