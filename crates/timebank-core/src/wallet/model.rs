use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Unlock,
}

/// One ledger entry. Unlock transactions carry the allocation
/// breakdown (bucket name to money amount); deposits carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocations: Option<HashMap<String, f64>>,
}

impl Transaction {
    pub fn deposit(amount: f64, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            kind: TransactionKind::Deposit,
            amount,
            description: description.into(),
            allocations: None,
        }
    }

    pub fn unlock(
        amount: f64,
        description: impl Into<String>,
        allocations: HashMap<String, f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            kind: TransactionKind::Unlock,
            amount,
            description: description.into(),
            allocations: Some(allocations),
        }
    }
}

/// A priced unlock duration. Catalog entry, not user data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnlockOption {
    pub duration_minutes: u32,
    pub price: f64,
}

impl UnlockOption {
    pub fn new(duration_minutes: u32, price: f64) -> Self {
        Self {
            duration_minutes,
            price,
        }
    }

    /// "15 min", "1h 5min", "2 hours".
    pub fn duration_text(&self) -> String {
        if self.duration_minutes >= 60 {
            let hours = self.duration_minutes / 60;
            let mins = self.duration_minutes % 60;
            if mins > 0 {
                format!("{hours}h {mins}min")
            } else if hours > 1 {
                format!("{hours} hours")
            } else {
                format!("{hours} hour")
            }
        } else {
            format!("{} min", self.duration_minutes)
        }
    }

    /// "$0.50".
    pub fn price_text(&self) -> String {
        format!("${:.2}", self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_text_variants() {
        assert_eq!(UnlockOption::new(15, 0.5).duration_text(), "15 min");
        assert_eq!(UnlockOption::new(60, 1.0).duration_text(), "1 hour");
        assert_eq!(UnlockOption::new(120, 2.0).duration_text(), "2 hours");
        assert_eq!(UnlockOption::new(65, 1.0).duration_text(), "1h 5min");
    }

    #[test]
    fn price_text_is_two_decimals() {
        assert_eq!(UnlockOption::new(15, 0.5).price_text(), "$0.50");
        assert_eq!(UnlockOption::new(30, 1.0).price_text(), "$1.00");
    }

    #[test]
    fn deposit_carries_no_breakdown() {
        let tx = Transaction::deposit(20.0, "Added credit");
        assert_eq!(tx.kind, TransactionKind::Deposit);
        assert!(tx.allocations.is_none());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json.get("type").unwrap(), "deposit");
        assert!(json.get("allocations").is_none());
    }
}
