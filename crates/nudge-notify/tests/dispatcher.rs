//! Dispatcher behaviour over the in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nudge_core::run_span;
use nudge_notify::fakes::MemoryTransport;
use nudge_notify::{
    DeliveryTarget, DispatchConfig, Dispatcher, Recipient, Reminder, RetryPolicy, Transport,
    TransportError,
};
use tracing::Instrument;
use tracing_test::traced_test;

fn reminder(file: &str, assignees: &[&str]) -> Reminder {
    Reminder {
        assignees: assignees.iter().map(|a| a.to_string()).collect(),
        owner: Some("lead@example.com".to_string()),
        file: file.to_string(),
        start_line: Some(4),
        end_line: Some(5),
        event_message: "We are past the *2015-03-01* due date and your TODO is now ready to be addressed."
            .to_string(),
        references: Vec::new(),
        body: "Remove the shim.\n".to_string(),
    }
}

fn not_found(code: &str) -> TransportError {
    TransportError::Api {
        code: code.to_string(),
    }
}

fn rate_limited() -> TransportError {
    TransportError::RateLimited {
        retry_after: Some(Duration::from_secs(1)),
    }
}

fn dispatcher(transport: &Arc<MemoryTransport>, config: DispatchConfig) -> Dispatcher {
    Dispatcher::new(transport.clone(), config)
}

#[tokio::test]
async fn test_user_and_channel_assignees_each_get_a_message() {
    let transport = Arc::new(MemoryTransport::new().with_name("john@example.com", "John"));
    let reports = dispatcher(&transport, DispatchConfig::default().with_workers(2))
        .dispatch(vec![reminder("app/a.rb", &["john@example.com", "#ops"])])
        .await;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_success()));
    assert_eq!(reports[0].assignee, "john@example.com");
    assert_eq!(
        reports[0].target,
        Some(DeliveryTarget::User {
            id: "U:john@example.com".to_string(),
            display_name: Some("John".to_string()),
        })
    );
    assert_eq!(
        reports[1].target,
        Some(DeliveryTarget::Channel {
            id: "#ops".to_string()
        })
    );

    let mut posted = transport.posted();
    posted.sort_by(|a, b| a.channel.cmp(&b.channel));
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[0].channel, "#ops");
    assert!(posted[0].text.starts_with("Hello :wave:,"));
    assert!(posted[0].text.contains("This TODO is owned by lead@example.com."));
    assert_eq!(posted[1].channel, "U:john@example.com");
    assert!(posted[1].text.starts_with("Hello John :wave:,"));
    assert!(!posted[1].text.contains("owned by"));
}

#[tokio::test]
async fn test_any_assignee_with_an_at_sign_is_looked_up_as_a_user() {
    let transport = Arc::new(MemoryTransport::new());
    let reports = dispatcher(&transport, DispatchConfig::default().with_workers(1))
        .dispatch(vec![reminder("app/a.rb", &["@team-lead", "john@localhost"])])
        .await;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_success()));
    assert_eq!(
        reports[0].target,
        Some(DeliveryTarget::User {
            id: "U:@team-lead".to_string(),
            display_name: None,
        })
    );
    assert_eq!(
        reports[1].target,
        Some(DeliveryTarget::User {
            id: "U:john@localhost".to_string(),
            display_name: None,
        })
    );
    // one lookup and one post per assignee
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn test_unknown_user_is_rerouted_to_fallback_channel() {
    let transport = Arc::new(
        MemoryTransport::new().fail_lookup("gone@example.com", not_found("users_not_found")),
    );
    let config = DispatchConfig::default().with_fallback_channel("#todo-fallback");

    let reports = dispatcher(&transport, config)
        .dispatch(vec![reminder("app/a.rb", &["gone@example.com"])])
        .await;

    assert!(reports[0].is_success(), "{:?}", reports[0].error);
    assert_eq!(reports[0].attempts, 2);
    assert_eq!(
        reports[0].target,
        Some(DeliveryTarget::FallbackChannel {
            id: "#todo-fallback".to_string(),
            original_assignee: "gone@example.com".to_string(),
        })
    );

    let posted = transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].channel, "#todo-fallback");
    assert!(posted[0]
        .text
        .contains("`gone@example.com` had an assigned TODO but this user or channel doesn't exist on Slack anymore."));
}

#[tokio::test]
async fn test_archived_channel_is_rerouted_on_post() {
    let transport =
        Arc::new(MemoryTransport::new().fail_post("#old-team", not_found("is_archived")));
    let config = DispatchConfig::default().with_fallback_channel("#todo-fallback");

    let reports = dispatcher(&transport, config)
        .dispatch(vec![reminder("app/a.rb", &["#old-team"])])
        .await;

    assert!(reports[0].is_success());
    assert_eq!(transport.posted()[0].channel, "#todo-fallback");
}

#[tokio::test]
async fn test_unknown_user_without_fallback_fails_only_that_unit() {
    let transport = Arc::new(
        MemoryTransport::new().fail_lookup("gone@example.com", not_found("users_not_found")),
    );

    let reports = dispatcher(&transport, DispatchConfig::default())
        .dispatch(vec![reminder("app/a.rb", &["gone@example.com", "ok@example.com"])])
        .await;

    assert!(!reports[0].is_success());
    assert!(reports[0]
        .error
        .as_deref()
        .unwrap()
        .contains("no fallback channel"));
    assert!(reports[1].is_success());
    assert_eq!(transport.posted().len(), 1);
}

#[tokio::test]
async fn test_other_api_errors_are_not_rerouted() {
    let transport =
        Arc::new(MemoryTransport::new().fail_post("#ops", not_found("invalid_auth")));
    let config = DispatchConfig::default().with_fallback_channel("#todo-fallback");

    let reports = dispatcher(&transport, config)
        .dispatch(vec![reminder("app/a.rb", &["#ops"])])
        .await;

    let error = reports[0].error.as_deref().unwrap();
    assert!(error.contains("invalid_auth"), "{error}");
    assert!(transport.posted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_calls_are_retried() {
    let transport = Arc::new(
        MemoryTransport::new()
            .fail_lookup("john@example.com", rate_limited())
            .fail_post("U:john@example.com", rate_limited()),
    );

    let reports = dispatcher(&transport, DispatchConfig::default())
        .dispatch(vec![reminder("app/a.rb", &["john@example.com"])])
        .await;

    assert!(reports[0].is_success());
    assert_eq!(reports[0].attempts, 4);
    assert_eq!(transport.posted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_gives_up_after_max_attempts() {
    let mut transport = MemoryTransport::new();
    for _ in 0..5 {
        transport = transport.fail_post("#ops", rate_limited());
    }
    let transport = Arc::new(transport);

    let started = tokio::time::Instant::now();
    let reports = dispatcher(&transport, DispatchConfig::default().with_retry(RetryPolicy::DEFAULT))
        .dispatch(vec![reminder("app/a.rb", &["#ops"])])
        .await;

    assert!(!reports[0].is_success());
    assert_eq!(reports[0].attempts, 5);
    assert!(started.elapsed() >= Duration::from_secs(4 * 30));
    assert!(transport.posted().is_empty());
}

#[tokio::test]
async fn test_reports_follow_reminder_then_assignee_order() {
    let transport = Arc::new(MemoryTransport::new());
    let reminders = vec![
        reminder("app/a.rb", &["a1@example.com", "#a2"]),
        reminder("app/b.rb", &["b1@example.com"]),
        reminder("app/c.rb", &["#c1", "c2@example.com", "#c3"]),
    ];

    let reports = dispatcher(&transport, DispatchConfig::default().with_workers(3))
        .dispatch(reminders)
        .await;

    let order: Vec<(&str, &str)> = reports
        .iter()
        .map(|r| (r.file.as_str(), r.assignee.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("app/a.rb", "a1@example.com"),
            ("app/a.rb", "#a2"),
            ("app/b.rb", "b1@example.com"),
            ("app/c.rb", "#c1"),
            ("app/c.rb", "c2@example.com"),
            ("app/c.rb", "#c3"),
        ]
    );
    assert_eq!(transport.posted().len(), 6);
}

#[tokio::test]
async fn test_nothing_to_dispatch() {
    let transport = Arc::new(MemoryTransport::new());
    let reports = dispatcher(&transport, DispatchConfig::default())
        .dispatch(Vec::new())
        .await;

    assert!(reports.is_empty());
    assert_eq!(transport.call_count(), 0);
}

/// Panics when asked to post to `#broken`.
struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn lookup_user(&self, email: &str) -> nudge_notify::Result<Recipient> {
        Ok(Recipient {
            id: email.to_string(),
            display_name: None,
        })
    }

    async fn post_message(&self, channel: &str, _text: &str) -> nudge_notify::Result<()> {
        if channel == "#broken" {
            panic!("transport blew up");
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_crashed_worker_units_are_reported_as_failed() {
    let reports = Dispatcher::new(Arc::new(PanickingTransport), DispatchConfig::default().with_workers(1))
        .dispatch(vec![reminder("app/a.rb", &["#broken", "#ops"])])
        .await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].assignee, "#broken");
    assert_eq!(reports[0].file, "app/a.rb");
    assert!(!reports[0].is_success());
    assert!(reports[0]
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("delivery worker failed")));
    // the lone worker died, so the second unit was never delivered either
    assert_eq!(reports[1].assignee, "#ops");
    assert!(!reports[1].is_success());
}

#[tokio::test]
#[traced_test]
async fn test_worker_logs_stay_inside_the_run_span() {
    let transport = Arc::new(MemoryTransport::new());
    let reports = dispatcher(&transport, DispatchConfig::default().with_workers(2))
        .dispatch(vec![reminder("app/a.rb", &["#ops", "#dev"])])
        .instrument(run_span("run-42"))
        .await;

    assert_eq!(reports.len(), 2);
    assert!(logs_contain("nudge.run{run_id=run-42}"));
    assert!(logs_contain("delivery.finished"));
    logs_assert(|lines: &[&str]| {
        let finished: Vec<_> = lines
            .iter()
            .filter(|line| line.contains("delivery.finished"))
            .collect();
        match finished.len() {
            2 if finished.iter().all(|line| line.contains("run_id=run-42")) => Ok(()),
            n => Err(format!("{n} delivery lines, not all inside the run span: {finished:?}")),
        }
    });
}
