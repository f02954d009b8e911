//! Pure step transitions. Nothing in here talks to the network.

use crate::conversation::{ConversationTurn, TurnRole};
use crate::plans::{Difficulty, Priority, ScheduleType, WorkoutType};

use super::{Flow, FlowStep, ManagerStep, WorkoutStep};

/// Plan to request once a flow has collected all of its answers
#[derive(Debug, Clone, PartialEq)]
pub enum PlanRequest {
    Workout {
        workout_type: WorkoutType,
        difficulty: Difficulty,
        duration: String,
        equipment: String,
    },
    Schedule {
        schedule_type: ScheduleType,
        start_time: String,
        work_style: String,
    },
    Tasks {
        priority: Priority,
    },
    /// Today's daily schedule with default business hours
    TodaySchedule,
}

/// Outcome of feeding one user message into a flow
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Enter the step and send its prompt
    Ask(FlowStep),
    /// Answer rejected; stay on the step and send its clarifying prompt
    Reprompt(FlowStep),
    /// Terminal step reached
    Generate(PlanRequest),
    /// Conversation state is unusable; start the flow over
    Reset(Flow),
}

impl Transition {
    /// Text reply for every transition that does not need the model
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Transition::Ask(step) => Some(step.prompt()),
            Transition::Reprompt(step) => Some(step.reprompt().unwrap_or_else(|| step.prompt())),
            Transition::Reset(flow) => Some(flow.lost_track_message()),
            Transition::Generate(_) => None,
        }
    }

    /// Step the conversation is left in; `None` once the flow is finished
    pub fn next_step(&self) -> Option<FlowStep> {
        match self {
            Transition::Ask(step) | Transition::Reprompt(step) => Some(*step),
            Transition::Reset(flow) => Some(flow.initial()),
            Transition::Generate(_) => None,
        }
    }
}

fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

/// Most recent user answer that parses as a value of the enumerated set
fn recover_choice<T>(history: &[ConversationTurn], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    history
        .iter()
        .rev()
        .filter(|turn| turn.role == TurnRole::User)
        .filter_map(|turn| turn.text())
        .find_map(|text| parse(&normalize(text)))
}

/// Most recent user answer given right after the assistant asked `prompt`
fn recover_answer(history: &[ConversationTurn], prompt: &str) -> Option<String> {
    history
        .windows(2)
        .rev()
        .find(|pair| {
            pair[0].role == TurnRole::Assistant
                && pair[0].text() == Some(prompt)
                && pair[1].role == TurnRole::User
        })
        .and_then(|pair| pair[1].text())
        .map(|text| text.trim().to_string())
}

/// Feed `message` into the flow at `step`
///
/// Enumerated steps accept their answer case-insensitively after trimming.
/// Free-text steps accept anything. Terminal steps recover earlier answers
/// from `history`; when one is missing the flow is reset.
pub fn advance(step: FlowStep, message: &str, history: &[ConversationTurn]) -> Transition {
    let answer = normalize(message);

    match step {
        FlowStep::Workout(WorkoutStep::Initial) => match WorkoutType::parse(&answer) {
            Some(_) => Transition::Ask(FlowStep::Workout(WorkoutStep::Difficulty)),
            None => Transition::Reprompt(step),
        },
        FlowStep::Workout(WorkoutStep::Difficulty) => match Difficulty::parse(&answer) {
            Some(_) => Transition::Ask(FlowStep::Workout(WorkoutStep::Duration)),
            None => Transition::Reprompt(step),
        },
        FlowStep::Workout(WorkoutStep::Duration) => {
            Transition::Ask(FlowStep::Workout(WorkoutStep::Equipment))
        }
        FlowStep::Workout(WorkoutStep::Equipment) => {
            let workout_type = recover_choice(history, WorkoutType::parse);
            let difficulty = recover_choice(history, Difficulty::parse);
            let duration = recover_answer(history, FlowStep::Workout(WorkoutStep::Duration).prompt());

            match (workout_type, difficulty, duration) {
                (Some(workout_type), Some(difficulty), Some(duration)) => {
                    Transition::Generate(PlanRequest::Workout {
                        workout_type,
                        difficulty,
                        duration,
                        equipment: message.trim().to_string(),
                    })
                }
                _ => Transition::Reset(Flow::Workout),
            }
        }

        FlowStep::Manager(ManagerStep::Initial) => {
            if answer.contains("schedule") {
                Transition::Ask(FlowStep::Manager(ManagerStep::ScheduleType))
            } else if answer.contains("task") || answer.contains("deliverable") {
                Transition::Ask(FlowStep::Manager(ManagerStep::TaskPriority))
            } else {
                Transition::Reprompt(step)
            }
        }
        FlowStep::Manager(ManagerStep::ScheduleType) => match ScheduleType::parse(&answer) {
            Some(_) => Transition::Ask(FlowStep::Manager(ManagerStep::TimePreference)),
            None => Transition::Reprompt(step),
        },
        FlowStep::Manager(ManagerStep::TimePreference) => {
            Transition::Ask(FlowStep::Manager(ManagerStep::WorkStyle))
        }
        FlowStep::Manager(ManagerStep::WorkStyle) => {
            let schedule_type = recover_choice(history, ScheduleType::parse);
            let start_time =
                recover_answer(history, FlowStep::Manager(ManagerStep::TimePreference).prompt());

            match (schedule_type, start_time) {
                (Some(schedule_type), Some(start_time)) => Transition::Generate(PlanRequest::Schedule {
                    schedule_type,
                    start_time,
                    work_style: message.trim().to_string(),
                }),
                _ => Transition::Reset(Flow::Manager),
            }
        }
        FlowStep::Manager(ManagerStep::TaskPriority) => match Priority::parse(&answer) {
            Some(priority) => Transition::Generate(PlanRequest::Tasks { priority }),
            None => Transition::Reprompt(step),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::prompts;

    fn workout_history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("give me a leg workout"),
            ConversationTurn::assistant(prompts::WORKOUT_INITIAL),
            ConversationTurn::user("Legs"),
            ConversationTurn::assistant(prompts::WORKOUT_DIFFICULTY),
            ConversationTurn::user("intermediate"),
            ConversationTurn::assistant(prompts::WORKOUT_DURATION),
            ConversationTurn::user("45 minutes"),
            ConversationTurn::assistant(prompts::WORKOUT_EQUIPMENT),
        ]
    }

    #[test]
    fn test_each_answer_advances_one_step() {
        let order = [
            (WorkoutStep::Initial, "legs", WorkoutStep::Difficulty),
            (WorkoutStep::Difficulty, "beginner", WorkoutStep::Duration),
            (WorkoutStep::Duration, "30 minutes", WorkoutStep::Equipment),
        ];
        for (from, answer, to) in order {
            assert_eq!(
                advance(FlowStep::Workout(from), answer, &[]),
                Transition::Ask(FlowStep::Workout(to))
            );
        }
    }

    #[test]
    fn test_enumerated_answers_are_normalized() {
        let step = FlowStep::Workout(WorkoutStep::Initial);
        assert_eq!(
            advance(step, "  Full-Body ", &[]),
            Transition::Ask(FlowStep::Workout(WorkoutStep::Difficulty))
        );
    }

    #[test]
    fn test_invalid_answer_reprompts() {
        let step = FlowStep::Manager(ManagerStep::ScheduleType);
        let transition = advance(step, "funday", &[]);
        assert_eq!(transition, Transition::Reprompt(step));
        assert_eq!(
            transition.text(),
            Some("Please specify the schedule type as daily, weekly, or project.")
        );
        assert_eq!(transition.next_step(), Some(step));
    }

    #[test]
    fn test_workout_terminal_step_recovers_answers() {
        let transition = advance(
            FlowStep::Workout(WorkoutStep::Equipment),
            "home dumbbells",
            &workout_history(),
        );
        assert_eq!(
            transition,
            Transition::Generate(PlanRequest::Workout {
                workout_type: WorkoutType::Legs,
                difficulty: Difficulty::Intermediate,
                duration: "45 minutes".to_string(),
                equipment: "home dumbbells".to_string(),
            })
        );
        assert_eq!(transition.text(), None);
        assert_eq!(transition.next_step(), None);
    }

    #[test]
    fn test_terminal_step_without_answers_resets() {
        let transition = advance(FlowStep::Workout(WorkoutStep::Equipment), "gym", &[]);
        assert_eq!(transition, Transition::Reset(Flow::Workout));
        assert_eq!(transition.text(), Some(prompts::WORKOUT_LOST_TRACK));
        assert_eq!(transition.next_step(), Some(FlowStep::Workout(WorkoutStep::Initial)));
    }

    #[test]
    fn test_latest_answer_wins() {
        let mut history = workout_history();
        history.truncate(3);
        history.push(ConversationTurn::assistant(prompts::WORKOUT_LOST_TRACK));
        history.push(ConversationTurn::user("arms"));
        history.extend(workout_history().into_iter().skip(3));

        match advance(FlowStep::Workout(WorkoutStep::Equipment), "gym", &history) {
            Transition::Generate(PlanRequest::Workout { workout_type, .. }) => {
                assert_eq!(workout_type, WorkoutType::Arms)
            }
            other => panic!("unexpected transition: {:?}", other),
        }
    }

    #[test]
    fn test_manager_initial_choices() {
        let step = FlowStep::Manager(ManagerStep::Initial);
        assert_eq!(
            advance(step, "Create schedule", &[]),
            Transition::Ask(FlowStep::Manager(ManagerStep::ScheduleType))
        );
        assert_eq!(
            advance(step, "manage tasks", &[]),
            Transition::Ask(FlowStep::Manager(ManagerStep::TaskPriority))
        );
        assert_eq!(
            advance(step, "discuss deliverables", &[]),
            Transition::Ask(FlowStep::Manager(ManagerStep::TaskPriority))
        );
        assert_eq!(advance(step, "lunch", &[]), Transition::Reprompt(step));
    }

    #[test]
    fn test_schedule_terminal_step() {
        let history = vec![
            ConversationTurn::assistant(prompts::MANAGER_INITIAL),
            ConversationTurn::user("create schedule"),
            ConversationTurn::assistant(prompts::MANAGER_SCHEDULE_TYPE),
            ConversationTurn::user("Weekly"),
            ConversationTurn::assistant(prompts::MANAGER_TIME_PREFERENCE),
            ConversationTurn::user("8 AM"),
            ConversationTurn::assistant(prompts::MANAGER_WORK_STYLE),
        ];

        assert_eq!(
            advance(FlowStep::Manager(ManagerStep::WorkStyle), "morning", &history),
            Transition::Generate(PlanRequest::Schedule {
                schedule_type: ScheduleType::Weekly,
                start_time: "8 AM".to_string(),
                work_style: "morning".to_string(),
            })
        );
    }

    #[test]
    fn test_task_priority() {
        let step = FlowStep::Manager(ManagerStep::TaskPriority);
        assert_eq!(
            advance(step, "HIGH", &[]),
            Transition::Generate(PlanRequest::Tasks { priority: Priority::High })
        );
        assert_eq!(advance(step, "urgent", &[]), Transition::Reprompt(step));
    }
}
