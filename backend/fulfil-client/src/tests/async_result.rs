use crate::{AsyncResult, TaskState};

use serde_json::json;

/// **VALUE**: Verifies task handles are recognised by their class marker.
///
/// **BUG THIS CATCHES**: Would catch arbitrary objects with a `task_id` key being
/// treated as pollable tasks.
#[test]
fn given_marked_object_when_parsed_then_async_result_pending() {
    // GIVEN
    let value = json!({"__class__": "AsyncResult", "task_id": "t-1", "token": "tok"});

    // WHEN
    let result = AsyncResult::from_value(&value).unwrap();

    // THEN
    assert_eq!(result.task_id(), "t-1");
    assert_eq!(result.state(), TaskState::Pending);
    assert!(result.result().is_none());
}

#[test]
fn given_unmarked_object_when_parsed_then_none() {
    assert!(AsyncResult::from_value(&json!({"task_id": "t-1", "token": "tok"})).is_none());
    assert!(AsyncResult::from_value(&json!({"__class__": "AsyncResult"})).is_none());
}

#[test]
fn given_state_names_when_parsed_then_round_trip_and_progress_flags() {
    for state in ["PENDING", "STARTED", "FAILURE", "SUCCESS", "RETRY"] {
        assert_eq!(TaskState::parse(state).unwrap().as_str(), state);
    }
    assert!(TaskState::Started.is_in_progress());
    assert!(!TaskState::Retry.is_in_progress());
    assert!(TaskState::parse("DONE").is_none());
}
