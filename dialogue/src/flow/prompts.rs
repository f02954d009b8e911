//! Literal prompts of the scripted flows.
//!
//! Every literal maps to exactly one step, so the last assistant message is
//! enough to tell where a conversation stands.

use super::{FlowStep, ManagerStep, WorkoutStep};

pub const WORKOUT_INITIAL: &str = "I'll help you create a workout plan! First, what muscle group would you like to focus on? (legs, arms, chest, back, shoulders, core, cardio, or full-body)";
pub const WORKOUT_DIFFICULTY: &str =
    "Great choice! What's your fitness level? (beginner, intermediate, or advanced)";
pub const WORKOUT_DURATION: &str =
    "How much time do you have for this workout? (e.g., 30 minutes, 1 hour)";
pub const WORKOUT_EQUIPMENT: &str =
    "Do you have access to a gym, or are we working with home equipment?";

pub const WORKOUT_INITIAL_REPROMPT: &str = "I didn't catch that. Please choose one of: legs, arms, chest, back, shoulders, core, cardio, or full-body.";
pub const WORKOUT_DIFFICULTY_REPROMPT: &str =
    "Please specify your level as beginner, intermediate, or advanced.";
pub const WORKOUT_LOST_TRACK: &str =
    "I lost track of our conversation. Let's start over! What type of workout would you like?";

pub const MANAGER_INITIAL: &str = "I'll help you organize your work! What would you like to do? (create schedule, manage tasks, or discuss deliverables)";
pub const MANAGER_SCHEDULE_TYPE: &str =
    "What type of schedule would you like to create? (daily, weekly, or project)";
pub const MANAGER_TASK_PRIORITY: &str = "How would you prioritize this task? (high, medium, or low)";
pub const MANAGER_TIME_PREFERENCE: &str = "What time would you like to start your day?";
pub const MANAGER_WORK_STYLE: &str = "Do you prefer focused work in the morning or afternoon?";

pub const MANAGER_INITIAL_REPROMPT: &str =
    "Please choose one of: create schedule, manage tasks, or discuss deliverables.";
pub const MANAGER_SCHEDULE_TYPE_REPROMPT: &str =
    "Please specify the schedule type as daily, weekly, or project.";
pub const MANAGER_TASK_PRIORITY_REPROMPT: &str = "Please specify the priority as high, medium, or low.";
pub const MANAGER_LOST_TRACK: &str = "I lost track of our conversation. Let's start over! What would you like to do? (create schedule, manage tasks, or discuss deliverables)";

/// Every literal the assistant may send inside a flow, with the step it leaves the flow in
pub const PROMPT_TABLE: &[(&str, FlowStep)] = &[
    (WORKOUT_INITIAL, FlowStep::Workout(WorkoutStep::Initial)),
    (WORKOUT_DIFFICULTY, FlowStep::Workout(WorkoutStep::Difficulty)),
    (WORKOUT_DURATION, FlowStep::Workout(WorkoutStep::Duration)),
    (WORKOUT_EQUIPMENT, FlowStep::Workout(WorkoutStep::Equipment)),
    (WORKOUT_INITIAL_REPROMPT, FlowStep::Workout(WorkoutStep::Initial)),
    (WORKOUT_DIFFICULTY_REPROMPT, FlowStep::Workout(WorkoutStep::Difficulty)),
    (WORKOUT_LOST_TRACK, FlowStep::Workout(WorkoutStep::Initial)),
    (MANAGER_INITIAL, FlowStep::Manager(ManagerStep::Initial)),
    (MANAGER_SCHEDULE_TYPE, FlowStep::Manager(ManagerStep::ScheduleType)),
    (MANAGER_TIME_PREFERENCE, FlowStep::Manager(ManagerStep::TimePreference)),
    (MANAGER_WORK_STYLE, FlowStep::Manager(ManagerStep::WorkStyle)),
    (MANAGER_TASK_PRIORITY, FlowStep::Manager(ManagerStep::TaskPriority)),
    (MANAGER_INITIAL_REPROMPT, FlowStep::Manager(ManagerStep::Initial)),
    (MANAGER_SCHEDULE_TYPE_REPROMPT, FlowStep::Manager(ManagerStep::ScheduleType)),
    (MANAGER_TASK_PRIORITY_REPROMPT, FlowStep::Manager(ManagerStep::TaskPriority)),
    (MANAGER_LOST_TRACK, FlowStep::Manager(ManagerStep::Initial)),
];

/// Step a literal belongs to
pub fn step_for(text: &str) -> Option<FlowStep> {
    PROMPT_TABLE
        .iter()
        .find(|(literal, _)| *literal == text)
        .map(|(_, step)| *step)
}
