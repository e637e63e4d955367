use clap::Subcommand;
use uuid::Uuid;

use timebank_core::TargetSet;

use crate::common;

#[derive(Subcommand)]
pub enum LimitAction {
    /// Create a limit on a set of targets
    Add {
        /// Application identifiers to limit
        #[arg(long = "app")]
        apps: Vec<String>,
        /// Category identifiers to limit
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Web domains to limit
        #[arg(long = "domain")]
        domains: Vec<String>,
        /// Daily budget in minutes
        #[arg(long)]
        minutes: u32,
    },
    /// List limits
    List,
    /// Flip a limit between active and inactive
    Toggle { id: Uuid },
    /// Delete a limit
    Remove { id: Uuid },
    /// Re-apply shields and monitoring for every active limit
    Reapply,
}

pub fn run(action: LimitAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = common::registry()?;

    match action {
        LimitAction::Add {
            apps,
            categories,
            domains,
            minutes,
        } => {
            let targets = TargetSet {
                applications: apps,
                categories,
                web_domains: domains,
            };
            let limit = registry.add(targets, minutes)?;
            println!("added {} ({})", limit.id, limit.formatted_threshold());
        }
        LimitAction::List => {
            if registry.limits().is_empty() {
                println!("no limits");
            }
            for limit in registry.limits() {
                let state = if limit.active { "active" } else { "inactive" };
                println!(
                    "{}  {:8}  {:>8}  apps={} categories={} domains={}",
                    limit.id,
                    state,
                    limit.formatted_threshold(),
                    limit.targets.applications.len(),
                    limit.targets.categories.len(),
                    limit.targets.web_domains.len(),
                );
            }
        }
        LimitAction::Toggle { id } => match registry.toggle(id)? {
            Some(event) => println!("{}", serde_json::to_string(&event)?),
            None => println!("no limit with id {id}"),
        },
        LimitAction::Remove { id } => match registry.remove(id)? {
            Some(event) => println!("{}", serde_json::to_string(&event)?),
            None => println!("no limit with id {id}"),
        },
        LimitAction::Reapply => {
            let count = registry.reapply_all()?;
            println!("re-applied {count} active limit(s)");
        }
    }

    Ok(())
}
