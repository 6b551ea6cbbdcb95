use std::time::Duration;

use serde_json::json;

use super::*;
use crate::core::message::TranscriptRole;
use crate::utils::test_utils::{
    database_answer, plain_answer, response_from, ObservedEvent, RecordingObserver,
};

fn orchestrator() -> (ConversationOrchestrator, RecordingObserver) {
    let observer = RecordingObserver::new();
    let orchestrator =
        ConversationOrchestrator::with_observer(Timings::default(), observer.boxed());
    (orchestrator, observer)
}

fn submitted_cycle(commands: &[OrchestratorCommand]) -> CycleId {
    commands
        .iter()
        .find_map(|command| match command {
            OrchestratorCommand::SendQuery { cycle, .. } => Some(*cycle),
            _ => None,
        })
        .expect("submit should request a query")
}

#[test]
fn submit_appends_user_message_and_starts_thinking() {
    let (mut orchestrator, observer) = orchestrator();
    let commands = orchestrator.submit("Giá cổ phiếu AAPL?").expect("submit");

    let cycle = submitted_cycle(&commands);
    assert_eq!(
        commands,
        vec![OrchestratorCommand::SendQuery {
            cycle,
            question: "Giá cổ phiếu AAPL?".to_string()
        }]
    );
    assert_eq!(orchestrator.messages().len(), 1);
    assert!(orchestrator.messages()[0].is_from_user());
    assert_eq!(orchestrator.phase(), ConversationPhase::Submitting { cycle });
    assert!(orchestrator.thinking().is_active);
    assert_eq!(orchestrator.thinking().displayed_agent, AgentId::Conversation);
    assert_eq!(observer.events()[0], ObservedEvent::Submitted(cycle));
}

#[test]
fn blank_submissions_are_rejected_without_side_effects() {
    let (mut orchestrator, _) = orchestrator();
    assert_eq!(orchestrator.submit("  \n "), Err(SubmitError::EmptyMessage));
    assert!(orchestrator.messages().is_empty());
    assert!(orchestrator.phase().is_idle());
}

#[test]
fn submissions_while_in_flight_are_rejected() {
    let (mut orchestrator, _) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("first").unwrap());

    assert_eq!(
        orchestrator.submit("second"),
        Err(SubmitError::RequestInFlight { cycle })
    );
    assert_eq!(orchestrator.messages().len(), 1);
}

#[test]
fn response_without_correction_settles_after_one_grace() {
    let (mut orchestrator, observer) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("hello").unwrap());

    let commands = orchestrator.on_response(cycle, plain_answer());
    assert_eq!(
        commands,
        vec![OrchestratorCommand::ScheduleGrace {
            cycle,
            delay: Duration::from_millis(800)
        }]
    );
    assert_eq!(
        orchestrator.phase(),
        ConversationPhase::Settling {
            cycle,
            hold: SettleHold::Grace { corrected: false }
        }
    );
    assert!(orchestrator.thinking().is_active);

    assert!(orchestrator.on_grace_elapsed(cycle).is_empty());
    assert!(orchestrator.phase().is_idle());
    assert!(!orchestrator.thinking().is_active);
    assert_eq!(observer.classification_count(), 1);
}

#[test]
fn corrected_indicator_gets_an_extra_hold() {
    let (mut orchestrator, observer) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("AAPL").unwrap());

    orchestrator.on_response(cycle, database_answer());
    assert_eq!(orchestrator.thinking().displayed_agent, AgentId::DatabaseQuery);
    assert!(observer.events().contains(&ObservedEvent::IndicatorCorrected(
        cycle,
        AgentId::Conversation,
        AgentId::DatabaseQuery
    )));

    let hold = orchestrator.on_grace_elapsed(cycle);
    assert_eq!(
        hold,
        vec![OrchestratorCommand::ScheduleGrace {
            cycle,
            delay: Duration::from_millis(200)
        }]
    );
    assert!(orchestrator.thinking().is_active);
    assert_eq!(
        orchestrator.phase(),
        ConversationPhase::Settling {
            cycle,
            hold: SettleHold::CorrectionHold
        }
    );

    assert!(orchestrator.on_grace_elapsed(cycle).is_empty());
    assert!(orchestrator.phase().is_idle());
    assert!(!orchestrator.thinking().is_active);
}

#[test]
fn assistant_message_records_agent_and_attachments() {
    let (mut orchestrator, _) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("Vẽ biểu đồ").unwrap());

    orchestrator.on_response(
        cycle,
        response_from(json!({
            "answer": "Đã lưu ./visualizations/visualization_20240501_1.png",
            "routing_info": {"selected_agents": ["database_query", "visualize"]},
            "references": ["https://a.vn/x", "https://a.vn/x"]
        })),
    );

    let message = orchestrator.messages().last().expect("assistant message");
    assert!(message.is_assistant());
    assert_eq!(message.agent, Some(AgentId::Visualize));
    assert_eq!(
        message.chart_image_path(),
        Some("/visualizations/visualization_20240501_1.png")
    );
    assert_eq!(message.citations.len(), 1);
    assert_eq!(
        orchestrator.last_classification().map(|c| c.source),
        Some(crate::core::classifier::SignalSource::Routing)
    );
}

#[test]
fn transport_failure_returns_to_idle_without_classifying() {
    let (mut orchestrator, observer) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("hello").unwrap());

    let commands = orchestrator.on_failure(
        cycle,
        QueryError::Transport("connection refused".to_string()),
    );
    assert_eq!(
        commands,
        vec![OrchestratorCommand::ScheduleGrace {
            cycle,
            delay: Duration::from_millis(500)
        }]
    );
    assert!(orchestrator.on_grace_elapsed(cycle).is_empty());

    assert!(orchestrator.phase().is_idle());
    assert_eq!(orchestrator.messages().len(), 2);
    let error = &orchestrator.messages()[1];
    assert_eq!(error.role, TranscriptRole::AppError);
    assert_eq!(error.content, "Error: connection refused");
    assert_eq!(observer.classification_count(), 0);
    assert!(observer.events().contains(&ObservedEvent::RequestFailed(cycle)));
}

#[test]
fn malformed_responses_are_reported_verbatim() {
    let (mut orchestrator, _) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("hello").unwrap());
    orchestrator.on_failure(cycle, QueryError::Malformed("response is missing `answer`".into()));

    assert_eq!(
        orchestrator.messages()[1].content,
        "Error: Malformed response: response is missing `answer`"
    );
}

#[test]
fn stale_grace_cannot_touch_the_next_cycle() {
    let (mut orchestrator, observer) = orchestrator();
    let first = submitted_cycle(&orchestrator.submit("first").unwrap());
    orchestrator.on_response(first, database_answer());

    let commands = orchestrator.submit("second").expect("settling allows a new cycle");
    assert_eq!(commands[0], OrchestratorCommand::CancelGrace { cycle: first });
    let second = submitted_cycle(&commands);
    assert!(second > first);
    assert_eq!(orchestrator.thinking().displayed_agent, AgentId::Conversation);

    assert!(orchestrator.on_grace_elapsed(first).is_empty());
    assert_eq!(orchestrator.phase(), ConversationPhase::Submitting { cycle: second });
    assert!(orchestrator.thinking().is_active);
    assert_eq!(orchestrator.thinking().displayed_agent, AgentId::Conversation);
    assert_eq!(observer.stale_count(), 1);
}

#[test]
fn late_responses_for_old_cycles_are_dropped() {
    let (mut orchestrator, observer) = orchestrator();
    let first = submitted_cycle(&orchestrator.submit("first").unwrap());
    orchestrator.on_failure(first, QueryError::Transport("timeout".into()));
    let second = submitted_cycle(&orchestrator.submit("second").unwrap());

    assert!(orchestrator.on_response(first, database_answer()).is_empty());
    assert!(orchestrator
        .on_failure(first, QueryError::Transport("again".into()))
        .is_empty());

    assert_eq!(orchestrator.phase(), ConversationPhase::Submitting { cycle: second });
    assert_eq!(orchestrator.messages().len(), 3);
    assert_eq!(observer.classification_count(), 0);
    assert_eq!(observer.stale_count(), 2);
}

#[test]
fn grace_for_a_cycle_still_in_flight_is_ignored() {
    let (mut orchestrator, observer) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("hello").unwrap());
    assert!(orchestrator.on_grace_elapsed(cycle).is_empty());
    assert_eq!(orchestrator.phase(), ConversationPhase::Submitting { cycle });
    assert_eq!(observer.stale_count(), 1);
}

#[test]
fn notes_do_not_disturb_the_cycle() {
    let (mut orchestrator, _) = orchestrator();
    let cycle = submitted_cycle(&orchestrator.submit("hello").unwrap());
    orchestrator.add_app_note("Logging paused");
    orchestrator.on_response(cycle, plain_answer());

    let roles: Vec<TranscriptRole> = orchestrator.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            TranscriptRole::User,
            TranscriptRole::AppInfo,
            TranscriptRole::Assistant
        ]
    );
}

#[test]
fn cycle_ids_increase_monotonically() {
    let (mut orchestrator, _) = orchestrator();
    let mut previous = None;
    for question in ["a", "b", "c"] {
        let cycle = submitted_cycle(&orchestrator.submit(question).unwrap());
        if let Some(previous) = previous {
            assert!(cycle > previous);
        }
        orchestrator.on_response(cycle, plain_answer());
        orchestrator.on_grace_elapsed(cycle);
        previous = Some(cycle);
    }
    assert_eq!(previous.map(CycleId::get), Some(3));
}
