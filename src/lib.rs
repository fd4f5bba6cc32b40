pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, UserCommands};
pub use config::Config;

/// Load configuration from `--config` or the search path, then validate it.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => cli::cmd_init(),

        Commands::Register {
            username,
            password,
            out,
        } => cli::cmd_register(&config, &username, password.as_deref(), out.as_deref()).await,

        Commands::Login {
            username,
            password,
            key_file,
        } => cli::cmd_login(&config, &username, password.as_deref(), &key_file).await,

        Commands::Users { command } => match command {
            UserCommands::List { search, json } => {
                cli::cmd_users_list(&config, search.as_deref(), json).await
            }
            UserCommands::RotateKey { id, out, session } => {
                cli::cmd_users_rotate_key(&config, id, out.as_deref(), &session).await
            }
            UserCommands::Promote { id, session } => {
                cli::cmd_users_set_role(&config, id, true, &session).await
            }
            UserCommands::Demote { id, session } => {
                cli::cmd_users_set_role(&config, id, false, &session).await
            }
            UserCommands::Delete { id, yes, session } => {
                cli::cmd_users_delete(&config, id, yes, &session).await
            }
            UserCommands::Passwd {
                new_password,
                session,
            } => cli::cmd_users_passwd(&config, new_password.as_deref(), &session).await,
        },
    }
}
