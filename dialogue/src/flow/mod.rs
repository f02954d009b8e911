//! Scripted multi-turn flows of the coach and manager personas.
//!
//! A flow is a fixed sequence of steps. Each step owns the literal prompt the
//! assistant sends when entering it; the prompt table in [`prompts`] is derived
//! from these steps plus the clarifying re-prompts and the reset message.

pub mod prompts;
pub mod resolver;
pub mod transition;

use std::fmt;
use std::str::FromStr;

use crate::conversation::ConversationTurn;
use crate::error::DialogueError;
use crate::intent;
use crate::persona::Mode;

pub use resolver::resolve_step;
pub use transition::{advance, PlanRequest, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Workout,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkoutStep {
    Initial,
    Difficulty,
    Duration,
    Equipment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerStep {
    Initial,
    ScheduleType,
    TimePreference,
    WorkStyle,
    TaskPriority,
}

/// Position inside a flow, identified on the wire by a stable id like `workout.initial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStep {
    Workout(WorkoutStep),
    Manager(ManagerStep),
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Workout => "workout",
            Flow::Manager => "manager",
        }
    }

    /// Flow driven by a persona, if any
    pub fn for_mode(mode: Mode) -> Option<Flow> {
        match mode {
            Mode::Coach => Some(Flow::Workout),
            Mode::Manager => Some(Flow::Manager),
            _ => None,
        }
    }

    pub fn initial(self) -> FlowStep {
        match self {
            Flow::Workout => FlowStep::Workout(WorkoutStep::Initial),
            Flow::Manager => FlowStep::Manager(ManagerStep::Initial),
        }
    }

    /// Message sent when the conversation state cannot be trusted anymore
    pub fn lost_track_message(self) -> &'static str {
        match self {
            Flow::Workout => prompts::WORKOUT_LOST_TRACK,
            Flow::Manager => prompts::MANAGER_LOST_TRACK,
        }
    }

    /// Whether a fresh message asks to start this flow
    pub fn is_triggered_by(self, message: &str) -> bool {
        match self {
            Flow::Workout => intent::is_workout_request(message),
            Flow::Manager => intent::is_schedule_request(message) || intent::is_task_request(message),
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FlowStep {
    pub const ALL: [FlowStep; 9] = [
        FlowStep::Workout(WorkoutStep::Initial),
        FlowStep::Workout(WorkoutStep::Difficulty),
        FlowStep::Workout(WorkoutStep::Duration),
        FlowStep::Workout(WorkoutStep::Equipment),
        FlowStep::Manager(ManagerStep::Initial),
        FlowStep::Manager(ManagerStep::ScheduleType),
        FlowStep::Manager(ManagerStep::TimePreference),
        FlowStep::Manager(ManagerStep::WorkStyle),
        FlowStep::Manager(ManagerStep::TaskPriority),
    ];

    pub fn flow(self) -> Flow {
        match self {
            FlowStep::Workout(_) => Flow::Workout,
            FlowStep::Manager(_) => Flow::Manager,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            FlowStep::Workout(WorkoutStep::Initial) => "workout.initial",
            FlowStep::Workout(WorkoutStep::Difficulty) => "workout.difficulty",
            FlowStep::Workout(WorkoutStep::Duration) => "workout.duration",
            FlowStep::Workout(WorkoutStep::Equipment) => "workout.equipment",
            FlowStep::Manager(ManagerStep::Initial) => "manager.initial",
            FlowStep::Manager(ManagerStep::ScheduleType) => "manager.scheduleType",
            FlowStep::Manager(ManagerStep::TimePreference) => "manager.timePreference",
            FlowStep::Manager(ManagerStep::WorkStyle) => "manager.workStyle",
            FlowStep::Manager(ManagerStep::TaskPriority) => "manager.taskPriority",
        }
    }

    /// Question the assistant asks when entering this step
    pub fn prompt(self) -> &'static str {
        match self {
            FlowStep::Workout(WorkoutStep::Initial) => prompts::WORKOUT_INITIAL,
            FlowStep::Workout(WorkoutStep::Difficulty) => prompts::WORKOUT_DIFFICULTY,
            FlowStep::Workout(WorkoutStep::Duration) => prompts::WORKOUT_DURATION,
            FlowStep::Workout(WorkoutStep::Equipment) => prompts::WORKOUT_EQUIPMENT,
            FlowStep::Manager(ManagerStep::Initial) => prompts::MANAGER_INITIAL,
            FlowStep::Manager(ManagerStep::ScheduleType) => prompts::MANAGER_SCHEDULE_TYPE,
            FlowStep::Manager(ManagerStep::TimePreference) => prompts::MANAGER_TIME_PREFERENCE,
            FlowStep::Manager(ManagerStep::WorkStyle) => prompts::MANAGER_WORK_STYLE,
            FlowStep::Manager(ManagerStep::TaskPriority) => prompts::MANAGER_TASK_PRIORITY,
        }
    }

    /// Clarifying prompt for steps that only accept a fixed set of answers
    pub fn reprompt(self) -> Option<&'static str> {
        match self {
            FlowStep::Workout(WorkoutStep::Initial) => Some(prompts::WORKOUT_INITIAL_REPROMPT),
            FlowStep::Workout(WorkoutStep::Difficulty) => Some(prompts::WORKOUT_DIFFICULTY_REPROMPT),
            FlowStep::Manager(ManagerStep::Initial) => Some(prompts::MANAGER_INITIAL_REPROMPT),
            FlowStep::Manager(ManagerStep::ScheduleType) => Some(prompts::MANAGER_SCHEDULE_TYPE_REPROMPT),
            FlowStep::Manager(ManagerStep::TaskPriority) => Some(prompts::MANAGER_TASK_PRIORITY_REPROMPT),
            _ => None,
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FlowStep {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowStep::ALL
            .into_iter()
            .find(|step| step.id() == s.trim())
            .ok_or_else(|| DialogueError::UnknownFlowStep(s.to_string()))
    }
}

/// Decide whether `message` continues or starts `flow`
///
/// An explicit step id from the client wins over history. A step id that is
/// unknown or belongs to another flow resets the flow. Without any step the
/// flow starts only when the message asks for it.
pub fn engage(
    flow: Flow,
    message: &str,
    history: &[ConversationTurn],
    explicit_step: Option<&str>,
) -> Option<Transition> {
    let current = match explicit_step {
        Some(id) => match id.parse::<FlowStep>() {
            Ok(step) if step.flow() == flow => Some(step),
            Ok(step) => {
                tracing::debug!(step = %step, flow = %flow, "Step belongs to another flow");
                return Some(Transition::Reset(flow));
            }
            Err(e) => {
                tracing::debug!(error = %e, flow = %flow, "Ignoring state from client");
                return Some(Transition::Reset(flow));
            }
        },
        None => resolve_step(flow, history),
    };

    match current {
        Some(step) => Some(advance(step, message, history)),
        None if flow.is_triggered_by(message) => Some(Transition::Ask(flow.initial())),
        None => None,
    }
}
