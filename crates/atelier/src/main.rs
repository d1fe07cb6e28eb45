use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use atelier::{db, Config};

#[derive(Parser)]
#[command(name = "atelier", version, about = "Operator tasks for the atelier database")]
struct Cli {
    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate {
        /// Apply at most this many migrations.
        #[arg(long)]
        steps: Option<u32>,
    },
    /// List pending schema migrations.
    Status,
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> atelier::Result<()> {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => cli
            .database_url
            .clone()
            .or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })?;

    let conn = db::connect(&config).await?;

    match cli.command {
        Command::Migrate { steps } => {
            let steps = steps.filter(|n| *n > 0);
            let applied = db::migrate(&conn, steps).await?;
            info!(applied, "Done");
        }
        Command::Status => {
            let pending = db::pending_migrations(&conn).await?;
            if pending.is_empty() {
                println!("Schema is up to date");
            }
            for name in pending {
                println!("pending: {name}");
            }
        }
    }

    Ok(())
}
