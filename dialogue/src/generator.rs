//! Turns flow transitions into replies, calling the model for finished flows.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use zoey_core::{ChatCompletion, ChatCompletionRequest, ChatMessage};

use crate::conversation::Payload;
use crate::error::DialogueResult;
use crate::flow::{FlowStep, PlanRequest, Transition};
use crate::plans::{self, ScheduleType};

pub const WORKOUT_APOLOGY: &str =
    "I had trouble creating your workout plan. Let's try again in a moment! 💪";
pub const SCHEDULE_APOLOGY: &str = "I had trouble generating your schedule. Let's try again with specific preferences. When would you like your day to start?";
pub const TASKS_APOLOGY: &str =
    "I had trouble putting together your task list. Let's try again in a moment.";

const WORKOUT_SCHEMA: &str = r#"{
  "type": "legs" | "arms" | "chest" | "back" | "shoulders" | "core" | "cardio" | "full-body",
  "exercises": [
    {
      "name": "string",
      "sets": number,
      "reps": "string",
      "notes": "string" (optional)
    }
  ],
  "duration": "string",
  "difficulty": "beginner" | "intermediate" | "advanced"
}"#;

const TASK_LIST_SCHEMA: &str = r#"{
  "date": "YYYY-MM-DD",
  "tasks": [
    {
      "title": "string",
      "description": "string",
      "priority": "high" | "medium" | "low",
      "status": "todo" | "in-progress" | "blocked" | "completed",
      "dueDate": "string" (optional),
      "assignee": "string" (optional),
      "notes": "string" (optional)
    }
  ],
  "completedTasks": number,
  "totalTasks": number,
  "priority": { "high": number, "medium": number, "low": number }
}"#;

fn schedule_schema(schedule_type: ScheduleType, today: &str) -> String {
    format!(
        r#"{{
  "type": "{}",
  "blocks": [
    {{
      "startTime": "09:00",
      "endTime": "10:30",
      "activity": "string",
      "type": "meeting" | "focus" | "break" | "admin",
      "participants": ["string"] (optional),
      "notes": "string" (optional)
    }}
  ],
  "date": "{}",
  "totalHours": number,
  "focusTime": number,
  "meetingTime": number
}}"#,
        schedule_type.as_str(),
        today
    )
}

/// What a reply carries
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Text(String),
    Payload(Payload),
}

/// Reply of a flow turn, with the step the conversation is left in
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReply {
    pub body: ReplyBody,
    pub step: Option<FlowStep>,
}

impl FlowReply {
    fn text(text: impl Into<String>, step: Option<FlowStep>) -> Self {
        Self {
            body: ReplyBody::Text(text.into()),
            step,
        }
    }
}

/// Generates plans with the completion model
#[derive(Clone)]
pub struct PlanGenerator {
    llm: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    today: Option<NaiveDate>,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn ChatCompletion>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
            today: None,
        }
    }

    /// Pin the date used for "today", which otherwise follows the UTC clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Reply for a flow transition
    ///
    /// Prompts never touch the model. Finished flows issue exactly one JSON
    /// request; any failure there becomes a fixed apology.
    pub async fn respond(&self, transition: Transition) -> FlowReply {
        let step = transition.next_step();

        match transition {
            Transition::Generate(request) => {
                let body = match self.generate(&request).await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(error = %e, plan = plan_name(&request), "Plan generation failed");
                        ReplyBody::Text(apology(&request).to_string())
                    }
                };
                FlowReply { body, step }
            }
            other => FlowReply::text(other.text().unwrap_or_default(), step),
        }
    }

    /// Request and post-process one plan
    pub async fn generate(&self, request: &PlanRequest) -> DialogueResult<ReplyBody> {
        let today = self.today();
        let today_str = today.format("%Y-%m-%d").to_string();
        let (system, user) = self.prompts(request, &today_str);

        info!(plan = plan_name(request), "Requesting plan");
        let completion = ChatCompletionRequest::new(
            self.model.clone(),
            vec![ChatMessage::system(system), ChatMessage::user(user)],
        )
        .json_mode()
        .with_temperature(self.temperature);

        let raw = self.llm.complete(completion).await?;

        match request {
            PlanRequest::Workout {
                workout_type,
                difficulty,
                duration,
                ..
            } => {
                let plan = plans::parse_workout_plan(&raw, *workout_type, *difficulty, duration)?;
                Ok(ReplyBody::Text(plans::format_workout_plan(&plan)))
            }
            PlanRequest::Schedule { schedule_type, .. } => {
                let schedule = plans::parse_schedule(&raw, *schedule_type, today)?;
                Ok(ReplyBody::Payload(Payload::Schedule(schedule)))
            }
            PlanRequest::TodaySchedule => {
                let mut schedule = plans::parse_schedule(&raw, ScheduleType::Daily, today)?;
                schedule.schedule_type = ScheduleType::Daily;
                schedule.date = today_str;
                Ok(ReplyBody::Payload(Payload::Schedule(schedule)))
            }
            PlanRequest::Tasks { .. } => {
                let tasks = plans::parse_task_list(&raw, today)?;
                Ok(ReplyBody::Payload(Payload::Tasks(tasks)))
            }
        }
    }

    fn prompts(&self, request: &PlanRequest, today: &str) -> (String, String) {
        match request {
            PlanRequest::Workout {
                workout_type,
                difficulty,
                duration,
                equipment,
            } => (
                format!(
                    "You are a fitness expert. Generate a workout plan based on the user's preferences. Return ONLY valid JSON matching this exact WorkoutPlan type, with no additional text:\n{}",
                    WORKOUT_SCHEMA
                ),
                format!(
                    "Create a {} level {} workout that takes {}. Equipment available: {}",
                    difficulty.as_str(),
                    workout_type.as_str(),
                    duration,
                    equipment
                ),
            ),
            PlanRequest::Schedule {
                schedule_type,
                start_time,
                work_style,
            } => (
                format!(
                    "You are a scheduling expert. Generate a schedule based on the user's preferences. Return ONLY valid JSON matching this exact Schedule type, with no additional text:\n{}",
                    schedule_schema(*schedule_type, today)
                ),
                format!(
                    "Create a {} schedule starting at {} with {} work style preference.",
                    schedule_type.as_str(),
                    start_time,
                    work_style
                ),
            ),
            PlanRequest::TodaySchedule => (
                format!(
                    "You are a scheduling expert. Generate a schedule based on typical business hours and common work activities.\nReturn ONLY valid JSON matching this exact Schedule type:\n{}",
                    schedule_schema(ScheduleType::Daily, today)
                ),
                format!(
                    "Create a daily schedule for today ({}) with:\n- A mix of meetings, focus time, and breaks\n- Start time around 9 AM\n- End time around 5 PM\n- Include lunch break\n- Good balance of focus time and meetings",
                    today
                ),
            ),
            PlanRequest::Tasks { priority } => (
                format!(
                    "You are a task management expert. Generate a task list based on the user's priority preference. Return ONLY valid JSON matching this exact TaskList type, with no additional text:\n{}",
                    TASK_LIST_SCHEMA
                ),
                format!(
                    "Create a task list for {} focusing on {} priority tasks.",
                    today,
                    priority.as_str()
                ),
            ),
        }
    }
}

fn plan_name(request: &PlanRequest) -> &'static str {
    match request {
        PlanRequest::Workout { .. } => "workout",
        PlanRequest::Schedule { .. } | PlanRequest::TodaySchedule => "schedule",
        PlanRequest::Tasks { .. } => "tasks",
    }
}

fn apology(request: &PlanRequest) -> &'static str {
    match request {
        PlanRequest::Workout { .. } => WORKOUT_APOLOGY,
        PlanRequest::Schedule { .. } | PlanRequest::TodaySchedule => SCHEDULE_APOLOGY,
        PlanRequest::Tasks { .. } => TASKS_APOLOGY,
    }
}
