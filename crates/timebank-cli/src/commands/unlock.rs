use chrono::Utc;
use clap::Subcommand;

use timebank_core::{
    AllocationSettings, Config, Event, ReblockScheduler, UnlockCoordinator, Wallet,
};

use crate::common;

#[derive(Subcommand)]
pub enum UnlockAction {
    /// The priced duration catalog
    Options,
    /// Is an unlock pending from the background monitor?
    Pending,
    /// Dismiss a pending unlock without paying (shield stays up)
    Dismiss,
    /// Pay for an unlock and lift the shield
    Buy {
        /// Duration to buy; must match a catalog option
        #[arg(long)]
        minutes: u32,
        /// Label shown in the transaction description
        #[arg(long, default_value = "App")]
        label: String,
        /// Block until the bought time elapses, then re-apply limits
        #[arg(long)]
        wait: bool,
    },
}

pub fn run(action: UnlockAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        UnlockAction::Options => {
            for option in &config.unlock_options {
                println!("{:>8}  {}", option.duration_text(), option.price_text());
            }
        }
        UnlockAction::Pending => {
            let (coordinator, _rx) = coordinator()?;
            if coordinator.has_pending_unlock() {
                let kind = coordinator
                    .pending_unlock_type()
                    .unwrap_or_else(|| "unknown".into());
                println!("pending unlock ({kind})");
            } else {
                println!("nothing pending");
            }
        }
        UnlockAction::Dismiss => {
            let (coordinator, _rx) = coordinator()?;
            coordinator.clear_pending_unlock()?;
            println!("dismissed; shield stays up");
        }
        UnlockAction::Buy {
            minutes,
            label,
            wait,
        } => {
            let option = config
                .unlock_options
                .iter()
                .find(|o| o.duration_minutes == minutes)
                .ok_or_else(|| format!("no {minutes}-minute option; see `unlock options`"))?;

            let store = common::open_store()?;
            let allocations = AllocationSettings::load(&store).percentages();
            let mut wallet =
                Wallet::load(store).with_minimum_balance(config.wallet.minimum_balance);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let (coordinator, mut rx) = coordinator()?;
                match coordinator.purchase(&mut wallet, option, &label, &allocations)? {
                    None => {
                        println!(
                            "insufficient funds: balance ${:.2}, price {}",
                            wallet.balance(),
                            option.price_text(),
                        );
                    }
                    Some(receipt) => {
                        println!("{}", serde_json::to_string(&receipt.event)?);
                        if wait {
                            println!("unlocked for {}; waiting...", option.duration_text());
                            if rx.recv().await.is_some() {
                                let mut registry = common::registry()?;
                                let count = registry.reapply_all()?;
                                let fired = Event::ReblockFired { at: Utc::now() };
                                println!("{}", serde_json::to_string(&fired)?);
                                println!("time's up, re-applied {count} limit(s)");
                            }
                        } else {
                            println!(
                                "unlocked for {}; limits re-apply on the next `limit reapply` or cold start",
                                option.duration_text(),
                            );
                        }
                    }
                }
                Ok::<_, Box<dyn std::error::Error>>(())
            })?;
        }
    }

    Ok(())
}

fn coordinator() -> Result<
    (
        UnlockCoordinator,
        tokio::sync::mpsc::UnboundedReceiver<timebank_core::ReblockToken>,
    ),
    Box<dyn std::error::Error>,
> {
    let (reblock, rx) = ReblockScheduler::new();
    Ok((
        UnlockCoordinator::new(common::open_store()?, common::shield_controller()?, reblock),
        rx,
    ))
}
