//! Keyword matchers deciding which handler a message belongs to.
//!
//! All checks are plain substring tests on the lowercased message.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Streak,
    Workout,
    Schedule,
    Task,
    Shop,
    Generic,
}

const WORKOUT_KEYWORDS: &[&str] = &[
    "workout",
    "exercise",
    "training",
    "routine",
    "exercises",
    "workouts",
    "program",
];
const WORKOUT_QUESTION_WORDS: &[&str] = &["what", "give", "create", "suggest", "plan", "help"];

const DIRECT_SCHEDULE_QUERIES: &[&str] = &["my schedule", "what do i have", "what's on", "whats on"];
const SCHEDULE_KEYWORDS: &[&str] = &[
    "schedule",
    "calendar",
    "agenda",
    "plan",
    "timetable",
    "meetings",
    "today",
    "tomorrow",
    "week",
    "my day",
];
const SCHEDULE_ACTION_WORDS: &[&str] = &[
    "create", "make", "plan", "organize", "set up", "arrange", "show", "what", "tell", "check",
    "view", "see", "get", "whats", "what's",
];

const TASK_KEYWORDS: &[&str] = &[
    "task",
    "todo",
    "to-do",
    "tasks",
    "list",
    "action items",
    "deliverable",
];
const TASK_ACTION_WORDS: &[&str] = &["create", "manage", "track", "list", "show", "organize"];

const SHOP_KEYWORDS: &[&str] = &[
    "buy", "shop", "purchase", "find", "search", "recommend", "suggest", "amazon", "product",
    "shopping",
];

const STREAK_KEYWORDS: &[&str] = &[
    "streak",
    "progress",
    "days",
    "record",
    "consecutive",
    "achievement",
];
const STREAK_QUESTION_WORDS: &[&str] = &["what", "how", "show", "tell", "check", "view"];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

pub fn is_workout_request(message: &str) -> bool {
    let text = message.to_lowercase();
    contains_any(&text, WORKOUT_KEYWORDS) && contains_any(&text, WORKOUT_QUESTION_WORDS)
}

/// "What's on my schedule" style questions that skip the scheduling flow
pub fn is_direct_schedule_query(message: &str) -> bool {
    contains_any(&message.to_lowercase(), DIRECT_SCHEDULE_QUERIES)
}

pub fn is_schedule_request(message: &str) -> bool {
    let text = message.to_lowercase();
    contains_any(&text, DIRECT_SCHEDULE_QUERIES)
        || (contains_any(&text, SCHEDULE_KEYWORDS) && contains_any(&text, SCHEDULE_ACTION_WORDS))
}

pub fn is_task_request(message: &str) -> bool {
    let text = message.to_lowercase();
    contains_any(&text, TASK_KEYWORDS) && contains_any(&text, TASK_ACTION_WORDS)
}

pub fn is_shop_request(message: &str) -> bool {
    contains_any(&message.to_lowercase(), SHOP_KEYWORDS)
}

pub fn is_streak_request(message: &str) -> bool {
    let text = message.to_lowercase();
    contains_any(&text, STREAK_KEYWORDS) && contains_any(&text, STREAK_QUESTION_WORDS)
}

/// First matching intent, checked as streak, workout, schedule, task, shop
pub fn classify(message: &str) -> Intent {
    if is_streak_request(message) {
        Intent::Streak
    } else if is_workout_request(message) {
        Intent::Workout
    } else if is_schedule_request(message) {
        Intent::Schedule
    } else if is_task_request(message) {
        Intent::Task
    } else if is_shop_request(message) {
        Intent::Shop
    } else {
        Intent::Generic
    }
}
