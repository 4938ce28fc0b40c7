use crate::policies::domain::PolicyStatus;
use PolicyStatus::*;

const ALL: [PolicyStatus; 6] = [
    NotProcessed,
    PendingAnalysis,
    Processing,
    Processed,
    FailedFetch,
    FailedAnalysis,
];

#[test]
fn happy_path_transitions_are_allowed() {
    assert!(NotProcessed.can_transition(Processing));
    assert!(Processing.can_transition(Processed));
    assert!(PendingAnalysis.can_transition(Processing));
}

#[test]
fn failure_transitions_are_allowed() {
    assert!(NotProcessed.can_transition(FailedFetch));
    assert!(Processing.can_transition(FailedAnalysis));
    assert!(Processed.can_transition(FailedFetch));
}

#[test]
fn reprocessing_is_allowed_from_terminal_states() {
    assert!(Processed.can_transition(Processing));
    assert!(FailedFetch.can_transition(Processing));
    assert!(FailedAnalysis.can_transition(Processing));
}

#[test]
fn skipping_the_processing_step_is_rejected() {
    for from in ALL {
        if from != Processing {
            assert!(
                !from.can_transition(Processed),
                "{} must not jump straight to processed",
                from.label()
            );
        }
    }
    assert!(!Processing.can_transition(NotProcessed));
    assert!(!Processed.can_transition(FailedAnalysis));
}

#[test]
fn labels_are_snake_case() {
    assert_eq!(NotProcessed.label(), "not_processed");
    assert_eq!(PendingAnalysis.label(), "pending_analysis");
    assert_eq!(Processing.label(), "processing");
    assert_eq!(Processed.label(), "processed");
    assert_eq!(FailedFetch.label(), "failed_fetch");
    assert_eq!(FailedAnalysis.label(), "failed_analysis");
}
