#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Works portal API server.
//!
//! ```text
//! works_portal_server [serve]
//! works_portal_server migrate
//! works_portal_server create-superadmin --username <name> --email <email> --password <password>
//! ```
//!
//! Configuration is read from the environment; see
//! [`works_portal_server::config`].

use clap::{Parser, Subcommand};
use works_portal_server::config::Config;
use works_portal_server::{ServerError, create_superadmin, migrate, run_server};

#[derive(Parser)]
#[command(name = "works_portal_server", about = "Public works reporting portal API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and serve the API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create the first superadmin account
    CreateSuperadmin {
        #[arg(long, env = "SUPERADMIN_USERNAME")]
        username: String,
        #[arg(long, env = "SUPERADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "SUPERADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[actix_web::main]
async fn main() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Migrate => migrate(&config).await,
        Commands::CreateSuperadmin {
            username,
            email,
            password,
        } => create_superadmin(&config, username, email, password)
            .await
            .map(|_| ()),
    }
}
