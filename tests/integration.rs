//! End-to-end tests across admission, advisories, and monitoring

use callgate::{
    AdmissionController, AlertKind, ApiLimitConfig, GateConfig, GateError, GlobalLimits,
};
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinSet;

fn pipeline_config() -> GateConfig {
    GateConfig::from_yaml_str(
        r#"
global:
  requests_per_minute: 1000
apis:
  default:
    requests_per_minute: 60
  whois:
    requests_per_minute: 10
    priority: high
  scanner:
    requests_per_minute: 2
    backoff: fixed
monitor:
  alert_cooldown_secs: 300
"#,
    )
    .expect("valid config")
}

#[tokio::test]
async fn test_full_admission_flow() {
    let controller = AdmissionController::new(pipeline_config());

    // Admitted, real call made, outcome recorded
    let decision = controller.check_rate_limit("whois").await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 9);
    controller
        .record_api_call("whois", true, Duration::from_millis(120), None)
        .await;

    let metrics = controller.get_metrics("whois").await.unwrap();
    assert_eq!(metrics.total_checks, 1);
    assert_eq!(metrics.total_calls, 1);
    assert_eq!(metrics.avg_response_time_ms, 120.0);

    let status = controller.get_rate_limit_status("whois").await.unwrap();
    assert_eq!(status.minute.used, 1);
    assert_eq!(status.minute.remaining, 9);
}

#[tokio::test]
async fn test_quota_bound_under_concurrency() {
    let limit = 10u32;
    let mut config = GateConfig::default();
    config.apis.insert(
        "scanner".to_string(),
        ApiLimitConfig {
            requests_per_minute: limit,
            ..ApiLimitConfig::default()
        },
    );
    let controller = AdmissionController::new(config);

    let mut tasks = JoinSet::new();
    for _ in 0..30 {
        let controller = controller.clone();
        tasks.spawn(async move {
            controller
                .check_rate_limit("scanner")
                .await
                .unwrap()
                .allowed
        });
    }

    let mut admitted = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap() {
            admitted += 1;
        }
    }

    // Check-and-increment is a single critical section: exactly the
    // configured budget is admitted, no matter the interleaving
    assert_eq!(admitted, limit);
}

#[tokio::test]
async fn test_blocked_caller_proceeds_via_cached_response() {
    let controller = AdmissionController::new(pipeline_config());
    controller
        .cache()
        .store("scanner", json!({"verdict": "clean"}));

    controller.check_rate_limit("scanner").await.unwrap();
    controller.check_rate_limit("scanner").await.unwrap();

    let blocked = controller.check_rate_limit("scanner").await.unwrap();
    assert!(!blocked.allowed);
    assert!(blocked.cache_hit);

    // The caller takes the advisory path instead of waiting
    let payload = controller.cache().get("scanner").unwrap();
    assert_eq!(payload, json!({"verdict": "clean"}));
}

#[tokio::test]
async fn test_degraded_endpoint_raises_alert_for_operator() {
    let controller = AdmissionController::new(pipeline_config());

    // Burn the scanner budget and keep checking
    for _ in 0..3 {
        controller.check_rate_limit("scanner").await.unwrap();
    }

    let alerts = controller.get_active_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].endpoint, "scanner");
    assert_eq!(alerts[0].kind, AlertKind::QuotaExceeded);

    controller.acknowledge_alert(&alerts[0].id).await.unwrap();
    controller.resolve_alert(&alerts[0].id).await.unwrap();
    assert!(controller.get_active_alerts().await.is_empty());

    let err = controller.resolve_alert("no-such-id").await.unwrap_err();
    assert!(matches!(err, GateError::AlertNotFound(_)));
}

#[tokio::test]
async fn test_global_budget_spans_endpoints() {
    let mut config = pipeline_config();
    config.global = GlobalLimits {
        requests_per_minute: 1,
        ..GlobalLimits::default()
    };
    let controller = AdmissionController::new(config);

    assert!(controller.check_rate_limit("whois").await.unwrap().allowed);
    assert!(!controller.check_rate_limit("scanner").await.unwrap().allowed);

    let global = controller.get_global_rate_limit_status().await;
    assert_eq!(global.minute.used, 1);
    assert_eq!(global.minute.remaining, 0);
}

#[tokio::test]
async fn test_wait_bounded_by_deadline_against_exhausted_endpoint() {
    let controller = AdmissionController::new(pipeline_config());
    controller.check_rate_limit("scanner").await.unwrap();
    controller.check_rate_limit("scanner").await.unwrap();

    let started = std::time::Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(100);
    let err = controller
        .wait_for_rate_limit("scanner", Some(deadline))
        .await
        .unwrap_err();

    assert!(matches!(err, GateError::Cancelled(_)));
    assert!(started.elapsed() >= Duration::from_millis(90));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_background_sweep_runs_alongside_traffic() {
    let mut config = pipeline_config();
    config.monitor.sweep_interval_secs = 1;
    let controller = AdmissionController::new(config);
    controller.start().await;

    for _ in 0..20 {
        let _ = controller.check_rate_limit("whois").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Recording kept working while the sweep ticked
    let metrics = controller.get_metrics("whois").await.unwrap();
    assert_eq!(metrics.total_checks, 20);

    controller.stop().await;
}
