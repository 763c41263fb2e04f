//! portal-session - drive the portal's session handling from a terminal.
//!
//! One-shot commands have no session tier, so `login` lands in the
//! persistent tier. `shell` keeps an in-memory session tier alive for as
//! long as it runs, like a browser tab.

mod shell;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_session_core::{
    FileStorage, KeyValueStore, MemoryStorage, Navigator, Role, RolePolicy, RouteTable,
    SessionStore, SiteConfig, Token,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shell::{ConsoleNavigator, Shell};

#[derive(Parser)]
#[command(name = "portal-session")]
#[command(about = "Simulate portal logins, page guards and logouts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the persistent storage tier
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the landing page of every role
    Routes,

    /// Show the token in persistent storage
    Status,

    /// Log in as a role and print its landing page
    Login {
        /// Role name (estudiante, docente, psicologo, coordinador, admin)
        role: String,
    },

    /// Clear the token and print the login page
    Logout,

    /// Interactive browsing session
    Shell {
        /// Disable the session tier, as in private browsing
        #[arg(long)]
        private: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // RUST_LOG wins; otherwise warn, or debug with --verbose
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => SiteConfig::load_from(path)?,
        None => SiteConfig::load()?,
    };
    debug!(?config, "Config loaded");

    let disk = match &cli.storage_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::in_cache_dir()?,
    };
    debug!(path = ?disk.path(), "Persistent storage");

    match cli.command {
        Commands::Routes => print_routes(&config),
        Commands::Status => print_status(&config, &disk, &mut io::stdout()),
        Commands::Login { role } => {
            let store = config.session_store(MemoryStorage::unavailable(), disk)?;
            let mut nav = ConsoleNavigator::new(io::stdout());
            let token = login(&config, &store, &role, &mut nav)?;
            info!(role = %token.role, "Token written");
            Ok(())
        }
        Commands::Logout => {
            let store = config.session_store(MemoryStorage::unavailable(), disk)?;
            store.logout(&mut ConsoleNavigator::new(io::stdout()));
            Ok(())
        }
        Commands::Shell { private } => {
            let session = if private {
                MemoryStorage::unavailable()
            } else {
                MemoryStorage::new()
            };
            let store = config.session_store(session, disk)?;
            let form = config.login_form(&store);
            let stdin = io::stdin();
            Shell::new(store, form, io::stdout()).run(stdin.lock())
        }
    }
}

fn print_routes(config: &SiteConfig) -> Result<()> {
    let routes = config.route_table()?;
    for (role, path) in routes.entries() {
        println!("{:<12} {:<18} {}", role, RouteTable::filename(role), path);
    }
    println!("{:<12} {:<18} {}", "(login)", "", routes.login_path());
    Ok(())
}

/// Log in as `role`. The strict policy refuses unknown roles outright
/// rather than falling back to the default selection.
fn login(
    config: &SiteConfig,
    store: &SessionStore,
    role: &str,
    nav: &mut impl Navigator,
) -> Result<Token> {
    if store.policy() == RolePolicy::Strict {
        role.parse::<Role>()
            .with_context(|| format!("Cannot log in as {role:?} under the strict role policy"))?;
    }
    let mut form = config.login_form(store);
    form.select_role(role);
    Ok(form.submit(store, nav))
}

/// Print the token in persistent storage. Unreadable storage and
/// malformed tokens are reported as logged out.
fn print_status(config: &SiteConfig, disk: &FileStorage, out: &mut impl Write) -> Result<()> {
    let token = match disk.get_item(&config.storage_key) {
        Ok(Some(raw)) => match Token::decode(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "Ignoring stored token");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, path = ?disk.path(), "Persistent storage read failed");
            None
        }
    };

    match token {
        Some(token) if token.logged => {
            writeln!(out, "{}", serde_json::to_string_pretty(&token)?)?;
            writeln!(out, "age: {}s", token.age().num_seconds())?;
        }
        _ => writeln!(out, "logged out")?,
    }
    Ok(())
}
