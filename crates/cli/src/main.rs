mod apps_cmd;
mod auth_cmd;
mod config_cmd;
mod connect;
mod rebuild_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::connect::ConnectArgs;

#[derive(Parser)]
#[command(name = "mcphub", about = "mcphub CLI - manage MCP server apps")]
struct Cli {
    /// Config file (defaults to ~/.config/mcphub/mcphub.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend URL, overriding config and environment
    #[arg(long, global = true)]
    server: Option<String>,

    /// Dashboard password (falls back to MCPHUB_PASSWORD, then a prompt)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal dashboard (default)
    Tui,

    /// List apps and their status
    Apps,

    /// Deploy an app, or restart it if it is running
    Deploy { app: String },

    /// Stop a running app
    Stop { app: String },

    /// Delete an app
    Delete {
        app: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Create a new app
    Create { name: String },

    /// Print recent container output
    Logs { app: String },

    /// Show the Web IDE password of a running app
    Password {
        app: String,
        /// Generate a new password instead
        #[arg(long)]
        reset: bool,
        /// Skip the reset confirmation prompt
        #[arg(long, requires = "reset")]
        yes: bool,
    },

    /// Show or change the MCP endpoint authentication of an app
    Auth(auth_cmd::AuthArgs),

    /// Rebuild an app and stream the build output
    Rebuild { app: String },

    /// Print the Web IDE link of a running app
    Open { app: String },

    /// Show or set configuration
    Config(config_cmd::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    let result = match command {
        Commands::Tui => mcphub_tui::run(mcphub_tui::RunOptions {
            config_path: cli.config,
            server_url: cli.server,
        }),
        command => {
            init_stderr_logging();
            let args = ConnectArgs {
                config_path: cli.config,
                server_url: cli.server,
                password: cli.password,
            };
            run_remote(command, args)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_remote(command: Commands, args: ConnectArgs) -> Result<()> {
    if let Commands::Config(config_args) = command {
        return config_cmd::run(config_args, args.config_path.as_deref(), args.server_url);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let session = connect::connect(&args).await?;
        match command {
            Commands::Apps => apps_cmd::list(&session).await,
            Commands::Deploy { app } => apps_cmd::deploy(&session, &app).await,
            Commands::Stop { app } => apps_cmd::stop(&session, &app).await,
            Commands::Delete { app, yes } => apps_cmd::delete(&session, &app, yes).await,
            Commands::Create { name } => apps_cmd::create(&session, &name).await,
            Commands::Logs { app } => apps_cmd::logs(&session, &app).await,
            Commands::Password { app, reset, yes } => {
                apps_cmd::password(&session, &app, reset, yes).await
            }
            Commands::Open { app } => apps_cmd::open(&session, &app).await,
            Commands::Auth(args) => auth_cmd::run(&session, args).await,
            Commands::Rebuild { app } => rebuild_cmd::run(&session, &app).await,
            Commands::Tui | Commands::Config(_) => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_reset_accepts_yes() {
        let cli = Cli::try_parse_from(["mcphub", "password", "weather", "--reset", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Password { reset: true, yes: true, .. })
        ));
    }

    #[test]
    fn password_reset_confirms_by_default() {
        let cli = Cli::try_parse_from(["mcphub", "password", "weather", "--reset"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Password { reset: true, yes: false, .. })
        ));
        assert!(Cli::try_parse_from(["mcphub", "password", "weather", "--yes"]).is_err());
    }
}
