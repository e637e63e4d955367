use clap::Subcommand;

use timebank_core::{Config, Wallet};

use crate::common;

#[derive(Subcommand)]
pub enum WalletAction {
    /// Current balance and lifetime totals
    Balance,
    /// Add credit
    Deposit { amount: f64 },
    /// Transaction history, newest first
    History {
        /// Show at most this many entries
        #[arg(long, default_value = "20")]
        count: usize,
    },
    /// Zero the wallet and investment buckets
    Reset,
}

pub fn run(action: WalletAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut wallet =
        Wallet::load(common::open_store()?).with_minimum_balance(config.wallet.minimum_balance);

    match action {
        WalletAction::Balance => {
            println!("balance:        ${:.2}", wallet.balance());
            println!("total invested: ${:.2}", wallet.total_invested());
            println!("this week:      ${:.2}", wallet.this_week_invested());
            println!("this month:     ${:.2}", wallet.this_month_invested());
            if wallet.needs_deposit() {
                println!("balance is low, deposit to keep unlocks available");
            }
        }
        WalletAction::Deposit { amount } => {
            let tx = wallet.deposit(amount)?;
            println!("deposited ${:.2} ({})", tx.amount, tx.id);
        }
        WalletAction::History { count } => {
            if wallet.transactions().is_empty() {
                println!("no transactions");
            }
            for tx in wallet.transactions().iter().take(count) {
                println!(
                    "{}  {:8}  ${:>6.2}  {}",
                    tx.date.format("%Y-%m-%d %H:%M"),
                    format!("{:?}", tx.kind).to_lowercase(),
                    tx.amount,
                    tx.description,
                );
            }
        }
        WalletAction::Reset => {
            wallet.reset()?;
            println!("wallet reset");
        }
    }

    Ok(())
}
