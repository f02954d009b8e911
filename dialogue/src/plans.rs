//! Structured plans requested from the completion endpoint as raw JSON.
//!
//! The model's answer is parsed into a `serde_json::Value`, optional fields
//! are backfilled, and the result is deserialized into the typed plan. Typed
//! deserialization is the shape validation: anything that does not fit is an
//! [`DialogueError::InvalidPlan`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DialogueError, DialogueResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutType {
    Legs,
    Arms,
    Chest,
    Back,
    Shoulders,
    Core,
    Cardio,
    FullBody,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 8] = [
        WorkoutType::Legs,
        WorkoutType::Arms,
        WorkoutType::Chest,
        WorkoutType::Back,
        WorkoutType::Shoulders,
        WorkoutType::Core,
        WorkoutType::Cardio,
        WorkoutType::FullBody,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutType::Legs => "legs",
            WorkoutType::Arms => "arms",
            WorkoutType::Chest => "chest",
            WorkoutType::Back => "back",
            WorkoutType::Shoulders => "shoulders",
            WorkoutType::Core => "core",
            WorkoutType::Cardio => "cardio",
            WorkoutType::FullBody => "full-body",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == text)
    }

    /// Fixed warm-up routine for this muscle group; everything but legs gets the upper-body one
    pub fn warmup(self) -> &'static [&'static str] {
        match self {
            WorkoutType::Legs => LEG_WARMUP,
            _ => UPPER_WARMUP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == text)
    }
}

pub const LEG_WARMUP: &[&str] = &[
    "Light jogging in place for 2 minutes",
    "Bodyweight squats (10 reps)",
    "Walking lunges (10 each leg)",
    "Hip rotations",
    "Ankle rotations",
];

pub const UPPER_WARMUP: &[&str] = &[
    "Arm circles (forward and backward)",
    "Shoulder rolls",
    "Wall push-ups (10 reps)",
    "Torso twists",
    "Light jumping jacks",
];

pub const COOLDOWN: &[&str] = &[
    "Light walking in place",
    "Deep breathing exercises",
    "Basic stretches for worked muscle groups",
    "Light shoulder and arm stretches",
    "Gentle torso twists",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    /// "12", "Until failure", "30 seconds"
    #[serde(deserialize_with = "string_or_number")]
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub warmup: Vec<String>,
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub cooldown: Vec<String>,
    pub duration: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Project,
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 3] = [ScheduleType::Daily, ScheduleType::Weekly, ScheduleType::Project];

    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleType::Daily => "daily",
            ScheduleType::Weekly => "weekly",
            ScheduleType::Project => "project",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Meeting,
    Focus,
    Break,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub start_time: String,
    pub end_time: String,
    pub activity: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub blocks: Vec<TimeBlock>,
    pub date: String,
    pub total_hours: f64,
    pub focus_time: f64,
    pub meeting_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub date: String,
    pub tasks: Vec<Task>,
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub priority: PriorityBreakdown,
}

/// Accepts `"12"` as well as `12` for fields the model may emit either way
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Parse the model output into a JSON object
///
/// Markdown code fences around the object are tolerated.
pub fn parse_object(raw: &str) -> DialogueResult<Map<String, Value>> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(unfenced.trim()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DialogueError::InvalidPlan(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(DialogueError::InvalidPlan(format!("invalid JSON: {}", e))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn set_if_missing(map: &mut Map<String, Value>, key: &str, value: Value) {
    let missing = match map.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if missing {
        map.insert(key.to_string(), value);
    }
}

fn into_plan<T: serde::de::DeserializeOwned>(map: Map<String, Value>, what: &str) -> DialogueResult<T> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| DialogueError::InvalidPlan(format!("{} does not match the expected shape: {}", what, e)))
}

/// Parse a workout plan and replace its warm-up and cool-down with the fixed routines
pub fn parse_workout_plan(
    raw: &str,
    requested_type: WorkoutType,
    requested_difficulty: Difficulty,
    requested_duration: &str,
) -> DialogueResult<WorkoutPlan> {
    let mut map = parse_object(raw)?;
    set_if_missing(&mut map, "type", Value::from(requested_type.as_str()));
    set_if_missing(&mut map, "difficulty", Value::from(requested_difficulty.as_str()));
    set_if_missing(&mut map, "duration", Value::from(requested_duration));

    let mut plan: WorkoutPlan = into_plan(map, "workout plan")?;
    plan.warmup = plan.workout_type.warmup().iter().map(|s| s.to_string()).collect();
    plan.cooldown = COOLDOWN.iter().map(|s| s.to_string()).collect();
    Ok(plan)
}

/// Parse a schedule, filling in `type` and `date` when the model left them out
pub fn parse_schedule(raw: &str, schedule_type: ScheduleType, today: NaiveDate) -> DialogueResult<Schedule> {
    let mut map = parse_object(raw)?;
    set_if_missing(&mut map, "type", Value::from(schedule_type.as_str()));
    set_if_missing(&mut map, "date", Value::from(today.format("%Y-%m-%d").to_string()));
    into_plan(map, "schedule")
}

/// Parse a task list, filling in the date and any missing counters
pub fn parse_task_list(raw: &str, today: NaiveDate) -> DialogueResult<TaskList> {
    let mut map = parse_object(raw)?;
    set_if_missing(&mut map, "date", Value::from(today.format("%Y-%m-%d").to_string()));

    let tasks: Vec<Task> = match map.get("tasks") {
        Some(tasks) => serde_json::from_value(tasks.clone())
            .map_err(|e| DialogueError::InvalidPlan(format!("task list has invalid tasks: {}", e)))?,
        None => return Err(DialogueError::InvalidPlan("task list has no tasks".to_string())),
    };

    let count = |p: Priority| tasks.iter().filter(|t| t.priority == p).count() as u32;
    let completed = tasks.iter().filter(|t| t.status == TaskStatus::Completed).count() as u32;

    set_if_missing(&mut map, "totalTasks", Value::from(tasks.len() as u32));
    set_if_missing(&mut map, "completedTasks", Value::from(completed));
    set_if_missing(
        &mut map,
        "priority",
        serde_json::json!({
            "high": count(Priority::High),
            "medium": count(Priority::Medium),
            "low": count(Priority::Low),
        }),
    );

    into_plan(map, "task list")
}

/// Render a workout plan the way the coach presents it in chat
pub fn format_workout_plan(plan: &WorkoutPlan) -> String {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|item| format!("• {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let exercises = plan
        .exercises
        .iter()
        .enumerate()
        .map(|(index, exercise)| {
            let mut block = format!(
                "{}. {}\n   • {} sets × {}",
                index + 1,
                exercise.name,
                exercise.sets,
                exercise.reps
            );
            if let Some(notes) = &exercise.notes {
                block.push_str(&format!("\n   • Note: {}", notes));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Here's your personalized {} workout! 💪

⏱️ Duration: {}
💪 Level: {}

🔥 Warm-up (5-10 minutes):
{}

📋 Main Workout:
{}

🧘‍♂️ Cool-down (5-10 minutes):
{}

⚠️ Remember:
• Stay hydrated 💧
• Maintain proper form
• Listen to your body
• Rest between sets (30-60 seconds)

Ready to crush this workout? Let me know if you need any clarification on the exercises! 💪",
        plan.workout_type.as_str().to_uppercase(),
        plan.duration,
        plan.difficulty.as_str(),
        bullets(&plan.warmup),
        exercises,
        bullets(&plan.cooldown),
    )
}
