use crate::conversation::{last_assistant_text, ConversationTurn};

use super::prompts;
use super::{Flow, FlowStep};

/// Current step of `flow`, judged from the most recent assistant turn
///
/// Only exact matches against the flow's literals count. A structured or
/// unknown last assistant turn means the conversation is not inside the flow.
pub fn resolve_step(flow: Flow, history: &[ConversationTurn]) -> Option<FlowStep> {
    let last = last_assistant_text(history)?;
    prompts::step_for(last).filter(|step| step.flow() == flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{ManagerStep, WorkoutStep};

    #[test]
    fn test_empty_history() {
        assert_eq!(resolve_step(Flow::Workout, &[]), None);
        assert_eq!(resolve_step(Flow::Manager, &[ConversationTurn::user("hi")]), None);
    }

    #[test]
    fn test_initial_prompt_resolves_to_initial() {
        let history = vec![
            ConversationTurn::user("give me a leg workout"),
            ConversationTurn::assistant(prompts::WORKOUT_INITIAL),
        ];
        assert_eq!(
            resolve_step(Flow::Workout, &history),
            Some(FlowStep::Workout(WorkoutStep::Initial))
        );
    }

    #[test]
    fn test_uses_latest_assistant_turn() {
        let history = vec![
            ConversationTurn::assistant(prompts::MANAGER_INITIAL),
            ConversationTurn::user("create schedule"),
            ConversationTurn::assistant(prompts::MANAGER_SCHEDULE_TYPE),
            ConversationTurn::user("funday"),
        ];
        assert_eq!(
            resolve_step(Flow::Manager, &history),
            Some(FlowStep::Manager(ManagerStep::ScheduleType))
        );
    }

    #[test]
    fn test_other_flow_prompt_is_ignored() {
        let history = vec![ConversationTurn::assistant(prompts::MANAGER_INITIAL)];
        assert_eq!(resolve_step(Flow::Workout, &history), None);
    }

    #[test]
    fn test_reprompt_keeps_step() {
        let history = vec![ConversationTurn::assistant(prompts::MANAGER_SCHEDULE_TYPE_REPROMPT)];
        assert_eq!(
            resolve_step(Flow::Manager, &history),
            Some(FlowStep::Manager(ManagerStep::ScheduleType))
        );
    }

    #[test]
    fn test_free_chat_reply_ends_flow() {
        let history = vec![
            ConversationTurn::assistant(prompts::WORKOUT_EQUIPMENT),
            ConversationTurn::user("gym"),
            ConversationTurn::assistant("Here's your personalized LEGS workout! 💪"),
        ];
        assert_eq!(resolve_step(Flow::Workout, &history), None);
    }
}
