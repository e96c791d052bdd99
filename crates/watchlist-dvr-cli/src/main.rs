use clap::{ArgAction, Parser, Subcommand};
use commands::{config, reconcile};
use dvr_sync_config::PathManager;
use dvr_sync_models::MediaType;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchlist-dvr")]
#[command(about = "Record what's on your Plex watchlist that you don't already own")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "json-pretty", value_enum)]
    output: output::OutputFormat,

    /// Write logs to this file (rotated daily) instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Read config.toml and credentials.toml from this directory
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the watchlist against the library and the DVR (one pass)
    #[command(long_about = "Compare the Plex watchlist with the local library and existing DVR subscriptions, and schedule recordings for items that are neither owned nor already scheduled. Prints a {\"watchlist\": [...]} report to stdout.")]
    Reconcile {
        /// Media type to reconcile
        #[arg(long = "type", value_enum, default_value = "movie")]
        media_type: MediaTypeArg,

        /// Plex server URL (overrides plex.server_url)
        #[arg(long, env = "PLEX_SERVER_URL")]
        server_url: Option<String>,

        /// Plex token (overrides the stored credential)
        #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Record failed submissions on the item and keep going
        #[arg(long, action = ArgAction::SetTrue)]
        continue_on_error: bool,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials for watchlist-dvr. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the token)
    Show {
        /// Show the token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Plex server and token
    #[command(long_about = "Configure the Plex server URL and token. The token is verified against plex.tv and stored in the credentials file. You can find your token by inspecting network requests in Plex Web (X-Plex-Token).")]
    Plex {
        /// Plex token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Plex server URL (if not provided, will prompt)
        #[arg(long)]
        server_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum MediaTypeArg {
    Movie,
    Show,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Movie => MediaType::Movie,
            MediaTypeArg::Show => MediaType::Show,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let paths = match cli.config_dir {
        Some(dir) => PathManager::with_base(dir),
        None => PathManager::default(),
    };

    match cli.command {
        Commands::Reconcile {
            media_type,
            server_url,
            token,
            continue_on_error,
        } => {
            let args = reconcile::ReconcileArgs {
                media_type: media_type.into(),
                server_url,
                token,
                continue_on_error,
            };
            reconcile::run_reconcile(args, &paths, &output).await
        }
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &paths, &output).await
        }
    }
}
