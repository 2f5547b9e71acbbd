use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use society_app_core::SettingsFile;
use society_cli::commands::{self, ConfigChange};
use society_cli::{open_console, resolve_settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Backend base URL (overrides settings.json and SOCIETY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Session store file
    #[arg(long, global = true)]
    store: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a one-time password for a phone number
    Login {
        phone: String,
        #[arg(short, long, help = "Sign in as a building admin of this building")]
        building: Option<String>,
    },
    /// Submit the one-time password received by SMS
    Verify { code: String },
    Resend,
    Logout,
    Whoami,
    /// Navigate to a console screen through the route guard
    Open { path: String },
    /// Expand or collapse the menu group of a path
    Menu { path: String },
    Status,
    /// Show or change the saved console settings
    Config {
        #[arg(long)]
        set_api_url: Option<String>,
        #[arg(long, conflicts_with = "clear_store")]
        set_store: Option<Utf8PathBuf>,
        /// Go back to the platform data dir for the session store
        #[arg(long)]
        clear_store: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Config {
            set_api_url,
            set_store,
            clear_store,
        } => {
            let change = ConfigChange {
                api_url: set_api_url,
                store: set_store,
                clear_store,
            };
            commands::cmd_config(&SettingsFile::platform()?, change)?;
            return Ok(());
        }
        other => other,
    };

    let settings = resolve_settings(cli.api_url, cli.store)?;
    let mut app = open_console(&settings)?;

    let result = match command {
        Commands::Login { phone, building } => {
            commands::cmd_login(&mut app, &phone, building.as_deref()).await
        }
        Commands::Verify { code } => commands::cmd_verify(&mut app, &code).await.map(|_| ()),
        Commands::Resend => commands::cmd_resend(&mut app).await,
        Commands::Logout => commands::cmd_logout(&mut app),
        Commands::Whoami => commands::cmd_whoami(&app),
        Commands::Open { path } => commands::cmd_open(&mut app, &path).map(|_| ()),
        Commands::Menu { path } => commands::cmd_menu(&mut app, &path),
        Commands::Status => commands::cmd_status(&app),
        // Settings-only; never reaches an open console.
        Commands::Config { .. } => Ok(()),
    };

    app.shutdown();
    result
}
