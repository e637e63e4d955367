use timebank_core::storage::keys;
use timebank_core::Wallet;

use crate::common;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = common::open_store()?;
    let shield = common::shield_controller()?;
    let accounting = common::accounting()?;

    let blocked = shield.blocked();
    if blocked.is_empty() {
        println!("shield: clear");
    } else {
        println!(
            "shield: blocking apps={:?} categories={:?} domains={:?}",
            blocked.applications, blocked.categories, blocked.web_domains,
        );
        if let Some(owner) = store.get_json::<String>(keys::ACTIVE_SHIELD_STORE_NAME)? {
            println!("last applied by limit {owner}");
        }
    }

    println!("monitoring: {} window(s) registered", accounting.registered().len());

    if store.get_bool(keys::PENDING_UNLOCK) {
        let kind = store
            .get_json::<String>(keys::PENDING_UNLOCK_TYPE)?
            .unwrap_or_else(|| "unknown".into());
        println!("pending unlock: yes ({kind})");
    } else {
        println!("pending unlock: no");
    }

    let wallet = Wallet::load(common::open_store()?);
    println!("balance: ${:.2}", wallet.balance());

    Ok(())
}
