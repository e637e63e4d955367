use clap::{Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "timebank-cli", version, about = "Timebank CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Usage limit management
    Limit {
        #[command(subcommand)]
        action: commands::limit::LimitAction,
    },
    /// Wallet and transactions
    Wallet {
        #[command(subcommand)]
        action: commands::wallet::WalletAction,
    },
    /// Investment allocations
    Invest {
        #[command(subcommand)]
        action: commands::invest::InvestAction,
    },
    /// Paid unlock flow
    Unlock {
        #[command(subcommand)]
        action: commands::unlock::UnlockAction,
    },
    /// Drive the background monitor by hand
    Simulate {
        #[command(subcommand)]
        action: commands::simulate::SimulateAction,
    },
    /// Shield, pending-unlock and wallet overview
    Status,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Limit { action } => commands::limit::run(action),
        Commands::Wallet { action } => commands::wallet::run(action),
        Commands::Invest { action } => commands::invest::run(action),
        Commands::Unlock { action } => commands::unlock::run(action),
        Commands::Simulate { action } => commands::simulate::run(action),
        Commands::Status => commands::status::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
