pub mod in_memory;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DialogueResult;

pub use in_memory::InMemoryActivityStore;

/// Daily-use streak of the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active: DateTime<Utc>,
    pub streak_start_date: DateTime<Utc>,
    pub total_days: u32,
    pub milestones: Milestones,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestones {
    pub next_milestone: u32,
    /// Percent of the way to `next_milestone`
    pub progress: u32,
}

impl Milestones {
    pub fn new(current_streak: u32, next_milestone: u32) -> Self {
        let progress = if next_milestone == 0 {
            100
        } else {
            ((current_streak as f64 / next_milestone as f64) * 100.0).round() as u32
        };
        Self {
            next_milestone,
            progress,
        }
    }
}

/// One line of the memory page activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action: String,
    pub description: String,
}

/// File kept in the user's memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: String,
}

/// Where streaks, the activity log and stored files come from
#[async_trait]
pub trait ActivityStore: Send + Sync + Debug {
    async fn streak(&self) -> DialogueResult<StreakData>;

    /// Activity log, newest first
    async fn activity(&self) -> DialogueResult<Vec<ActivityEntry>>;

    async fn files(&self) -> DialogueResult<Vec<StoredFile>>;
}

pub type ActivityStoreRef = Arc<dyn ActivityStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_progress() {
        assert_eq!(Milestones::new(7, 14).progress, 50);
        assert_eq!(Milestones::new(1, 3).progress, 33);
        assert_eq!(Milestones::new(2, 3).progress, 67);
        assert_eq!(Milestones::new(5, 0).progress, 100);
    }

    #[test]
    fn test_stored_file_serialization() {
        let file = StoredFile {
            name: "Logo Design".to_string(),
            file_type: "png".to_string(),
            size: "1.8 MB".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({"name": "Logo Design", "type": "png", "size": "1.8 MB"})
        );
    }
}
