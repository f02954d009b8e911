use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::error::DialogueResult;
use crate::store::{ActivityEntry, ActivityStore, Milestones, StoredFile, StreakData};

/// In-memory implementation of ActivityStore, seeded with demo data
#[derive(Debug, Clone)]
pub struct InMemoryActivityStore {
    current_streak: u32,
    longest_streak: u32,
    total_days: u32,
    next_milestone: u32,
    activity: Vec<ActivityEntry>,
    files: Vec<StoredFile>,
}

impl InMemoryActivityStore {
    /// Create a store with the demo streak, activity log and file list
    pub fn new() -> Self {
        Self {
            current_streak: 7,
            longest_streak: 14,
            total_days: 21,
            next_milestone: 14,
            activity: seed_activity(),
            files: seed_files(),
        }
    }

    /// Create an empty store with the given streak counters
    pub fn with_streak(current_streak: u32, longest_streak: u32, total_days: u32, next_milestone: u32) -> Self {
        Self {
            current_streak,
            longest_streak,
            total_days,
            next_milestone,
            activity: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl Default for InMemoryActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn streak(&self) -> DialogueResult<StreakData> {
        // The streak is always anchored at "now"
        let now = Utc::now();
        debug!(current = self.current_streak, "Serving streak");

        Ok(StreakData {
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            last_active: now,
            streak_start_date: now - Duration::days(i64::from(self.current_streak)),
            total_days: self.total_days,
            milestones: Milestones::new(self.current_streak, self.next_milestone),
        })
    }

    async fn activity(&self) -> DialogueResult<Vec<ActivityEntry>> {
        Ok(self.activity.clone())
    }

    async fn files(&self) -> DialogueResult<Vec<StoredFile>> {
        Ok(self.files.clone())
    }
}

fn seed_activity() -> Vec<ActivityEntry> {
    [
        ("2025-02-08 15:30", "Stored Document", "Added 'Project Proposal' to the documents folder"),
        ("2025-02-08 14:45", "Created Task", "New task: 'Prepare presentation for team meeting'"),
        ("2025-02-08 13:20", "Added Reference", "Added 'Machine Learning Basics' to the reference library"),
        ("2025-02-08 11:00", "Completed Task", "Finished task: 'Review quarterly report'"),
        ("2025-02-08 09:15", "Updated Document", "Made changes to 'Team Guidelines' document"),
    ]
    .into_iter()
    .map(|(timestamp, action, description)| ActivityEntry {
        timestamp: timestamp.to_string(),
        action: action.to_string(),
        description: description.to_string(),
    })
    .collect()
}

fn seed_files() -> Vec<StoredFile> {
    [
        ("Project Proposal", "pdf", "2.5 MB"),
        ("Team Meeting Notes", "docx", "1.2 MB"),
        ("Budget Spreadsheet", "xlsx", "3.7 MB"),
        ("Presentation Slides", "pptx", "5.1 MB"),
        ("Logo Design", "png", "1.8 MB"),
        ("Client Contract", "pdf", "3.2 MB"),
        ("Marketing Plan", "docx", "2.9 MB"),
        ("Product Roadmap", "xlsx", "4.5 MB"),
    ]
    .into_iter()
    .map(|(name, file_type, size)| StoredFile {
        name: name.to_string(),
        file_type: file_type.to_string(),
        size: size.to_string(),
    })
    .collect()
}
