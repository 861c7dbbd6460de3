mod config;
mod seed;
mod serve;

use std::process;

use clap::{Parser, Subcommand};

/// Cold-chain telemetry and incident service.
#[derive(Parser)]
#[command(
    name = "coldwatch",
    version,
    about = "Cold-chain telemetry and incident service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Per-device telemetry limit in readings per minute
        /// (overrides COLDWATCH_RATE_LIMIT)
        #[arg(long)]
        rate_limit: Option<usize>,

        /// Seed demo stores, devices, technicians, and users on startup
        #[arg(long)]
        seed_demo: bool,
    },

    /// Hash a password for provisioning a user account
    HashPassword {
        /// The plaintext password to hash
        password: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            port,
            rate_limit,
            seed_demo,
        } => {
            let config = match config::ServerConfig::from_env(rate_limit) {
                Ok(config) => config,
                Err(message) => {
                    eprintln!("Error: {}", message);
                    process::exit(2);
                }
            };
            if let Err(e) = serve::start_server(port, config, seed_demo).await {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Commands::HashPassword { password } => match coldwatch_auth::hash_password(&password) {
            Ok(hash) => println!("{}", hash),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
