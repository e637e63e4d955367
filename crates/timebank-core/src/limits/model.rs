use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The applications, categories and web domains a limit watches.
///
/// Identifiers are opaque tokens handed to the usage accounting service
/// and the shield resource; the core never looks inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet {
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub web_domains: Vec<String>,
}

impl TargetSet {
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.categories.is_empty() && self.web_domains.is_empty()
    }

    /// Convenience constructor for a set of applications only.
    pub fn applications<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            applications: apps.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// A daily time budget on a set of targets.
///
/// Created by user action, mutated only via toggle, removed via delete.
/// Serialized into the shared store's `savedLimits` record, so field
/// names match what the monitor context decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppLimit {
    pub id: Uuid,
    #[serde(rename = "selection")]
    pub targets: TargetSet,
    #[serde(rename = "timeLimitMinutes")]
    pub threshold_minutes: u32,
    #[serde(rename = "isActive")]
    pub active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl AppLimit {
    /// New limits start active.
    pub fn new(targets: TargetSet, threshold_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            targets,
            threshold_minutes,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// "45 min", "2h", "1h 5min".
    pub fn formatted_threshold(&self) -> String {
        let hours = self.threshold_minutes / 60;
        let minutes = self.threshold_minutes % 60;
        if hours > 0 && minutes > 0 {
            format!("{hours}h {minutes}min")
        } else if hours > 0 {
            format!("{hours}h")
        } else {
            format!("{minutes} min")
        }
    }
}
