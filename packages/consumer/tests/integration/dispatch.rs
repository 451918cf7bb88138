use ::common::Topic;
use consumer::Disposition;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn completed_task_is_notified() {
    let dispatcher = dispatcher(vec![Ok(0.93)], policy(0, false));
    let payload = learn_payload();

    let disposition = dispatcher.dispatch(Topic::Learn, "m-1", &payload).await;

    let Disposition::Completed(outcome) = disposition else {
        panic!("expected completion, got {disposition:?}");
    };
    assert_eq!(outcome.value, 0.93);
    assert_eq!(outcome.task.to_string(), payload["id"].as_str().unwrap());
    assert_eq!(dispatcher.handler().notifier().outcomes(), vec![outcome]);
}

#[tokio::test]
async fn prediction_outcome_carries_topic() {
    let dispatcher = dispatcher(vec![Ok(7.0)], policy(0, false));
    let disposition = dispatcher.dispatch(Topic::Pred, "m-2", &pred_payload()).await;
    assert!(matches!(
        disposition,
        Disposition::Completed(ref o) if o.topic == Topic::Pred && o.value == 7.0
    ));
}

#[tokio::test]
async fn malformed_message_is_dropped_without_calling_backend() {
    let dispatcher = dispatcher(vec![], policy(5, true));
    let disposition = dispatcher
        .dispatch(Topic::Learn, "m-3", &json!({"id": "not-a-uuid"}))
        .await;

    assert!(matches!(disposition, Disposition::Dropped { ref reason } if reason.starts_with("Error un-marshaling train task")));
    assert_eq!(dispatcher.handler().backend().calls(), 0);
    assert!(dispatcher.handler().notifier().outcomes().is_empty());
}

#[tokio::test]
async fn learn_payload_on_pred_topic_is_fatal() {
    let dispatcher = dispatcher(vec![], policy(5, true));
    let disposition = dispatcher.dispatch(Topic::Pred, "m-4", &learn_payload()).await;
    assert!(matches!(disposition, Disposition::Dropped { .. }));
}

#[tokio::test]
async fn backend_failure_is_fatal_by_default() {
    let dispatcher = dispatcher(vec![Err("docker unavailable".to_string())], policy(3, false));
    let disposition = dispatcher.dispatch(Topic::Test, "m-5", &learn_payload()).await;

    assert_eq!(
        disposition,
        Disposition::Dropped {
            reason: "Error in test task: docker unavailable".into()
        }
    );
    assert_eq!(dispatcher.handler().backend().calls(), 1);
}

#[tokio::test]
async fn retryable_failure_recovers() {
    let dispatcher = dispatcher(
        vec![Err("timeout".to_string()), Err("timeout".to_string()), Ok(0.5)],
        policy(2, true),
    );
    let disposition = dispatcher.dispatch(Topic::Learn, "m-6", &learn_payload()).await;

    assert!(matches!(disposition, Disposition::Completed(ref o) if o.value == 0.5));
    assert_eq!(dispatcher.handler().backend().calls(), 3);
    assert_eq!(dispatcher.handler().notifier().outcomes().len(), 1);
}

#[tokio::test]
async fn retries_stop_at_policy_limit() {
    let failures = (0..10).map(|i| Err(format!("attempt {i} failed"))).collect();
    let dispatcher = dispatcher(failures, policy(2, true));
    let disposition = dispatcher.dispatch(Topic::Learn, "m-7", &learn_payload()).await;

    assert_eq!(
        disposition,
        Disposition::Exhausted {
            attempts: 3,
            errors: vec![
                "Error in train task: attempt 0 failed".into(),
                "Error in train task: attempt 1 failed".into(),
                "Error in train task: attempt 2 failed".into(),
            ]
        }
    );
    assert_eq!(dispatcher.handler().backend().calls(), 3);
    assert!(dispatcher.handler().notifier().outcomes().is_empty());
}
