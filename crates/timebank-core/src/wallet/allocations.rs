//! Where unlock money goes: ordered buckets with percentages.
//!
//! Edited independently of the wallet and persisted under its own
//! record, so the unlock flow always reads the user's latest split.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, ValidationError};
use crate::storage::{keys, SharedStore};

/// One investment bucket and its share of every unlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAllocation {
    pub id: Uuid,
    pub name: String,
    pub percentage: f64,
    #[serde(rename = "colorName")]
    pub color_name: String,
    pub icon: String,
}

impl InvestmentAllocation {
    pub fn new(name: &str, percentage: f64, color_name: &str, icon: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            percentage,
            color_name: color_name.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// The user's allocation config, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSettings {
    pub allocations: Vec<InvestmentAllocation>,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            allocations: vec![
                InvestmentAllocation::new("Bitcoin", 40.0, "orange", "bitcoin"),
                InvestmentAllocation::new("Solana", 20.0, "purple", "solana"),
                InvestmentAllocation::new("S&P 500", 25.0, "blue", "chart"),
                InvestmentAllocation::new("T-Bills", 15.0, "green", "dollar"),
            ],
        }
    }
}

impl AllocationSettings {
    /// Load from the store; defaults when missing or undecodable.
    pub fn load(store: &SharedStore) -> Self {
        store
            .get_json::<Vec<InvestmentAllocation>>(keys::INVESTMENT_ALLOCATIONS)
            .ok()
            .flatten()
            .map(|allocations| Self { allocations })
            .unwrap_or_default()
    }

    pub fn save(&self, store: &SharedStore) -> Result<(), StoreError> {
        store.put_json(keys::INVESTMENT_ALLOCATIONS, &self.allocations)
    }

    /// Name-to-percentage map, the shape the unlock flow consumes.
    pub fn percentages(&self) -> HashMap<String, f64> {
        self.allocations
            .iter()
            .map(|a| (a.name.clone(), a.percentage))
            .collect()
    }

    /// Percentages must sum to exactly 100 before they can be used to
    /// split money.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sum: f64 = self.allocations.iter().map(|a| a.percentage).sum();
        if (sum - 100.0).abs() > 1e-9 {
            return Err(ValidationError::BadAllocationTotal { sum });
        }
        Ok(())
    }

    /// Replace the split, keeping bucket order. Rejects a set that does
    /// not sum to 100.
    pub fn set_percentages(&mut self, by_name: &HashMap<String, f64>) -> Result<(), ValidationError> {
        let mut next = self.clone();
        for allocation in &mut next.allocations {
            if let Some(pct) = by_name.get(&allocation.name) {
                allocation.percentage = *pct;
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sum_to_100() {
        let settings = AllocationSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.allocations[0].name, "Bitcoin");
        assert_eq!(settings.allocations[0].percentage, 40.0);
    }

    #[test]
    fn missing_record_loads_defaults() {
        let store = SharedStore::open_memory().unwrap();
        let settings = AllocationSettings::load(&store);
        let defaults = AllocationSettings::default();
        let names: Vec<&str> = settings.allocations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Bitcoin", "Solana", "S&P 500", "T-Bills"]);
        for (got, want) in settings.allocations.iter().zip(&defaults.allocations) {
            assert_eq!(got.percentage, want.percentage);
        }
    }

    #[test]
    fn roundtrips_through_store() {
        let store = SharedStore::open_memory().unwrap();
        let mut settings = AllocationSettings::default();
        settings
            .set_percentages(&HashMap::from([
                ("Bitcoin".to_string(), 55.0),
                ("Solana".to_string(), 5.0),
            ]))
            .unwrap();
        settings.save(&store).unwrap();

        let loaded = AllocationSettings::load(&store);
        assert_eq!(loaded.allocations[0].percentage, 55.0);
        assert_eq!(loaded.allocations[1].percentage, 5.0);
    }

    #[test]
    fn set_percentages_rejects_bad_total() {
        let mut settings = AllocationSettings::default();
        let err = settings
            .set_percentages(&HashMap::from([("Bitcoin".to_string(), 99.0)]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::BadAllocationTotal { .. }));
        // Unchanged on rejection.
        assert_eq!(settings.allocations[0].percentage, 40.0);
    }
}
