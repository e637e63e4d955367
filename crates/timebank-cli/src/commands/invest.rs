use std::collections::HashMap;

use clap::Subcommand;

use timebank_core::{AllocationSettings, Wallet};

use crate::common;

#[derive(Subcommand)]
pub enum InvestAction {
    /// Allocation split and accumulated amounts per bucket
    Show,
    /// Update the split, e.g. `set "Bitcoin=50" "Solana=10" ...`
    Set {
        /// name=percentage pairs; percentages must sum to 100
        pairs: Vec<String>,
    },
}

pub fn run(action: InvestAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = common::open_store()?;

    match action {
        InvestAction::Show => {
            let settings = AllocationSettings::load(&store);
            let wallet = Wallet::load(common::open_store()?);
            println!("total invested: ${:.2}", wallet.total_invested());
            for allocation in &settings.allocations {
                let accumulated = wallet
                    .investments_by_kind()
                    .get(&allocation.name)
                    .copied()
                    .unwrap_or(0.0);
                println!(
                    "{:10}  {:>5.1}%  ${:.2}",
                    allocation.name, allocation.percentage, accumulated,
                );
            }
        }
        InvestAction::Set { pairs } => {
            let mut by_name = HashMap::new();
            for pair in &pairs {
                let (name, pct) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected name=percentage, got '{pair}'"))?;
                by_name.insert(name.to_string(), pct.parse::<f64>()?);
            }

            let mut settings = AllocationSettings::load(&store);
            settings.set_percentages(&by_name)?;
            settings.save(&store)?;
            println!("allocations updated");
        }
    }

    Ok(())
}
