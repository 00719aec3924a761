use super::*;
use crate::scenarios::{NetworkLatency, Params};
use crate::test_utils::{FailingScenario, RecordingTerminator};
use serde_json::json;

fn manager() -> ScenarioManager {
    ScenarioManager::with_terminator(
        ScenarioSettings::default(),
        Arc::new(RecordingTerminator::new()),
    )
}

fn light_manager() -> ScenarioManager {
    ScenarioManager::from_scenarios(vec![
        Arc::new(NetworkLatency::new()),
        Arc::new(scenarios::DependencyFailure::new()),
        Arc::new(scenarios::HealthCheckFailure::new()),
    ])
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

async fn is_running(manager: &ScenarioManager, name: &str) -> bool {
    manager.status(name).await.unwrap().running
}

// ============================================================================
// Single scenario operations
// ============================================================================

#[tokio::test]
async fn test_list_is_sorted_and_complete() {
    let manager = manager();
    let list = manager.list().await;

    let names: Vec<_> = list.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "cpu_burner",
            "crash",
            "dependency",
            "disk_io",
            "goroutine_leak",
            "health_check",
            "memory_leaker",
            "network_latency",
        ]
    );
    assert!(list.iter().all(|s| !s.running));
    assert!(list.iter().all(|s| !s.description.is_empty()));
}

#[tokio::test]
async fn test_unknown_scenario_is_not_found() {
    let manager = light_manager();

    let err = manager.start("bogus", Params::new()).await.unwrap_err();
    assert_eq!(err, ScenarioError::NotFound("bogus".to_string()));
    assert!(matches!(
        manager.stop("bogus").await,
        Err(ScenarioError::NotFound(_))
    ));
    assert!(matches!(
        manager.status("bogus").await,
        Err(ScenarioError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_single_start_and_stop() {
    let manager = light_manager();

    manager
        .start("network_latency", params(json!({"latency_ms": 5})))
        .await
        .unwrap();
    assert!(is_running(&manager, "network_latency").await);

    manager.stop("network_latency").await.unwrap();
    manager.stop("network_latency").await.unwrap();
    assert!(!is_running(&manager, "network_latency").await);
}

#[tokio::test]
async fn test_get_scenario_downcasts_to_concrete_type() {
    let manager = light_manager();
    manager
        .start("network_latency", params(json!({"latency_ms": 42})))
        .await
        .unwrap();

    let scenario = manager.get_scenario("network_latency").await.unwrap();
    let latency = scenario
        .as_any()
        .downcast_ref::<NetworkLatency>()
        .unwrap()
        .latency()
        .await;
    assert_eq!(latency, Duration::from_millis(42));
}

// ============================================================================
// Composite sessions
// ============================================================================

#[tokio::test]
async fn test_no_active_session_sentinel() {
    let manager = light_manager();
    let session = manager.current_session().await;

    assert_eq!(session.status, SessionStatus::NoActiveSession);
    assert!(session.session_id.is_none());
    assert!(session.scenarios.is_empty());
}

#[tokio::test]
async fn test_composite_success() {
    let manager = light_manager();
    let response = manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", params(json!({"latency_ms": 10}))),
            ScenarioConfig::new("dependency", Params::new()),
        ])
        .await;

    assert_eq!(response.status, SessionStatus::Success);
    assert!(response.session_id.as_deref().unwrap().starts_with("session-"));
    assert_eq!(response.scenarios, vec!["network_latency", "dependency"]);
    assert!(response.details.iter().all(|d| d.success));

    let session = manager.current_session().await;
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(session.session_id, response.session_id);
    assert_eq!(session.details.len(), 2);
    assert!(session.details.iter().all(|d| d.success));
}

#[tokio::test]
async fn test_composite_partial_with_unknown_name() {
    let manager = light_manager();
    let response = manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()),
            ScenarioConfig::new("bogus", Params::new()),
        ])
        .await;

    assert_eq!(response.status, SessionStatus::Partial);
    assert_eq!(response.scenarios, vec!["network_latency"]);
    assert_eq!(response.details.len(), 2);
    assert_eq!(response.details[1].name, "bogus");
    assert!(!response.details[1].success);
    assert_eq!(
        response.details[1].error.as_deref(),
        Some("scenario bogus not found")
    );
}

#[tokio::test]
async fn test_composite_failed_when_nothing_starts() {
    let failing = Arc::new(FailingScenario::new());
    let manager = ScenarioManager::from_scenarios(vec![failing.clone()]);

    let response = manager
        .start_composite(vec![
            ScenarioConfig::new(FailingScenario::NAME, Params::new()),
            ScenarioConfig::new("bogus", Params::new()),
        ])
        .await;

    assert_eq!(response.status, SessionStatus::Failed);
    assert!(response.session_id.is_some());
    assert!(response.scenarios.is_empty());
    assert_eq!(response.details.len(), 2);
    assert!(response.details[0]
        .error
        .as_deref()
        .unwrap()
        .contains("refused"));

    // Failed members are never part of the session, so never stopped by it.
    manager.stop_all_scenarios().await;
    assert_eq!(failing.stops(), 0);
}

#[tokio::test]
async fn test_empty_composite_is_failed() {
    let manager = light_manager();
    let response = manager.start_composite(Vec::new()).await;
    assert_eq!(response.status, SessionStatus::Failed);
}

#[tokio::test]
async fn test_new_composite_replaces_previous_session() {
    let manager = light_manager();

    let first = manager
        .start_composite(vec![ScenarioConfig::new("network_latency", Params::new())])
        .await;
    assert!(is_running(&manager, "network_latency").await);

    let second = manager
        .start_composite(vec![ScenarioConfig::new("dependency", Params::new())])
        .await;

    assert!(!is_running(&manager, "network_latency").await);
    assert!(is_running(&manager, "dependency").await);

    let session = manager.current_session().await;
    assert_eq!(session.scenarios, vec!["dependency"]);
    assert_eq!(session.session_id, second.session_id);
    assert!(first.session_id.is_some());
}

#[tokio::test]
async fn test_stop_all_clears_session() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()),
            ScenarioConfig::new("health_check", Params::new()),
        ])
        .await;

    manager.stop_all_scenarios().await;

    assert!(!is_running(&manager, "network_latency").await);
    assert!(!is_running(&manager, "health_check").await);
    assert_eq!(
        manager.current_session().await.status,
        SessionStatus::NoActiveSession
    );

    // Idempotent.
    manager.stop_all_scenarios().await;
}

#[tokio::test]
async fn test_current_session_reflects_member_stop() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()),
            ScenarioConfig::new("dependency", Params::new()),
        ])
        .await;

    manager.stop("dependency").await.unwrap();

    let session = manager.current_session().await;
    assert_eq!(session.status, SessionStatus::Running);
    let dependency = session
        .details
        .iter()
        .find(|d| d.name == "dependency")
        .unwrap();
    assert!(!dependency.success);
}

// ============================================================================
// Recovery timer
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_recovery_timer_stops_session() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()).with_duration(1),
            ScenarioConfig::new("dependency", Params::new()),
        ])
        .await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(manager.current_session().await.status, SessionStatus::Running);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(
        manager.current_session().await.status,
        SessionStatus::NoActiveSession
    );
    assert!(!is_running(&manager, "network_latency").await);
    assert!(!is_running(&manager, "dependency").await);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_timer_uses_longest_duration() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()).with_duration(1),
            ScenarioConfig::new("dependency", Params::new()).with_duration(3),
        ])
        .await;

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(manager.current_session().await.status, SessionStatus::Running);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(
        manager.current_session().await.status,
        SessionStatus::NoActiveSession
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_recovery_timer_is_a_no_op() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()).with_duration(1),
        ])
        .await;
    manager.stop_all_scenarios().await;

    let replacement = manager
        .start_composite(vec![ScenarioConfig::new("dependency", Params::new())])
        .await;

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let session = manager.current_session().await;
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(session.session_id, replacement.session_id);
    assert!(is_running(&manager, "dependency").await);
}

#[tokio::test(start_paused = true)]
async fn test_replaced_session_timer_does_not_stop_successor() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()).with_duration(1),
        ])
        .await;
    manager
        .start_composite(vec![
            ScenarioConfig::new("dependency", Params::new()).with_duration(5),
        ])
        .await;

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(is_running(&manager, "dependency").await);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert!(!is_running(&manager, "dependency").await);
}

#[tokio::test(start_paused = true)]
async fn test_duration_of_unknown_member_is_ignored() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("bogus", Params::new()).with_duration(1),
            ScenarioConfig::new("network_latency", Params::new()),
        ])
        .await;

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(manager.current_session().await.status, SessionStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_non_positive_duration_arms_no_timer() {
    let manager = light_manager();
    manager
        .start_composite(vec![
            ScenarioConfig::new("network_latency", Params::new()).with_duration(0),
            ScenarioConfig::new("dependency", Params::new()).with_duration(-5),
        ])
        .await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(manager.current_session().await.status, SessionStatus::Running);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_stops_everything() {
    let manager = light_manager();
    manager
        .start("health_check", Params::new())
        .await
        .unwrap();
    manager
        .start_composite(vec![ScenarioConfig::new("network_latency", Params::new())])
        .await;

    manager.shutdown().await;

    assert!(!is_running(&manager, "health_check").await);
    assert!(!is_running(&manager, "network_latency").await);
    assert_eq!(
        manager.current_session().await.status,
        SessionStatus::NoActiveSession
    );
}
