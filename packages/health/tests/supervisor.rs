use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use restbind_core::{Context, Error, ErrorKind, TransportError, Value};
use restbind_health::{Supervised, Supervisor, SupervisorConfig};
use restbind_http::transport::mock::MockTransport;
use restbind_http::{Client, HttpResponse, Operation};

/// A small client for a suggestion service, counting hook invocations.
struct SugrecClient {
    http: Client,
    pings: AtomicUsize,
    restores: AtomicUsize,
    notified: AtomicUsize,
}

impl SugrecClient {
    fn new(transport: MockTransport) -> Self {
        Self {
            http: Client::new(transport),
            pings: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
            notified: AtomicUsize::new(0),
        }
    }

    async fn sugrec(&self, wd: &str) -> Result<Value, Error> {
        let op = Operation::get("/sugrec").query(0, "wd").query(1, "prod");
        self.http
            .execute(&op, vec![Value::from(wd), Value::from("pc")])
            .await
    }

    fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Supervised for SugrecClient {
    async fn ping(&self) -> Result<(), Error> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.http.execute(&Operation::get("/ping"), vec![]).await?;
        Ok(())
    }

    async fn restore(&self, _ctx: Option<&Context>) -> Result<(), Error> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Err(Error::Decode {
            message: "restore always fails here".to_string(),
        })
    }

    async fn notify_error(&self, _error: &Error) -> Result<(), Error> {
        self.notified.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn healthy_transport() -> MockTransport {
    MockTransport::new().with_default_response(HttpResponse::json(serde_json::json!({"ok": true})))
}

fn refused() -> TransportError {
    TransportError::network("connection refused")
}

fn heartbeat(ms: u64) -> SupervisorConfig {
    SupervisorConfig::default().with_heartbeat_interval(Duration::from_millis(ms))
}

#[tokio::test]
async fn fresh_supervisor_is_not_init() {
    let supervisor = Supervisor::new(SugrecClient::new(healthy_transport()), SupervisorConfig::default());

    let status = supervisor.status();
    assert!(!status.available);
    assert_eq!(status.message, "not init");
    assert!(!supervisor.is_initialized());
    assert!(!supervisor.is_recovering());
}

#[tokio::test]
async fn first_successful_probe_marks_available() {
    let supervisor = Supervisor::new(SugrecClient::new(healthy_transport()), SupervisorConfig::default());
    let mut changes = supervisor.subscribe();

    supervisor.ping().await.unwrap();

    let status = supervisor.status();
    assert!(status.available);
    assert_eq!(status.message, "ok");
    assert!(status.last_check_begin_time.is_some());
    assert!(status.last_check_end_time.is_some());
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().available);
}

#[tokio::test]
async fn consecutive_successes_stay_available() {
    let supervisor = Supervisor::new(SugrecClient::new(healthy_transport()), SupervisorConfig::default());

    for _ in 0..3 {
        let result = supervisor.call(|c| c.sugrec("test")).await.unwrap();
        assert_eq!(result, Value::from(serde_json::json!({"ok": true})));
    }

    assert!(supervisor.status().available);
    assert_eq!(supervisor.get_ref().pings(), 0);
}

#[tokio::test(start_paused = true)]
async fn outage_marks_unavailable_and_runs_hooks() {
    let transport = healthy_transport();
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), SupervisorConfig::default());
    supervisor.ping().await.unwrap();

    transport.set_failure(Some(refused()));
    let err = supervisor.call(|c| c.sugrec("test")).await.unwrap_err();

    // The caller sees the original typed error.
    assert_eq!(err.as_api().unwrap().kind(), ErrorKind::Network);

    let status = supervisor.status();
    assert!(!status.available);
    assert_eq!(status.message, "network error: connection refused");
    assert!(status.last_exception_time.is_some());
    assert!(status.last_restore_begin_time.is_some());
    assert!(status.last_restore_end_time.is_some());

    let client = supervisor.get_ref();
    assert_eq!(client.notified.load(Ordering::SeqCst), 1);
    assert_eq!(client.restores.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ambiguous_failure_leaves_status_untouched() {
    let transport = healthy_transport();
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), SupervisorConfig::default());
    supervisor.ping().await.unwrap();
    let before = supervisor.status();

    let _ = transport
        .clone()
        .with_failure("/sugrec", TransportError::status(400, None));
    let err = supervisor.call(|c| c.sugrec("bad")).await.unwrap_err();
    assert_eq!(err.as_api().unwrap().kind(), ErrorKind::Client);

    let after = supervisor.status();
    assert!(after.available);
    assert_eq!(after.message, before.message);
    assert!(after.last_exception_time.is_none());
    assert!(!supervisor.is_recovering());

    // Hooks still run for every failed call.
    assert_eq!(supervisor.get_ref().restores.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn one_probe_in_flight_for_back_to_back_failures() {
    let transport = healthy_transport().fail_with(refused());
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), heartbeat(1000));

    assert!(supervisor.call(|c| c.sugrec("a")).await.is_err());
    assert!(supervisor.call(|c| c.sugrec("b")).await.is_err());
    assert!(supervisor.is_recovering());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(supervisor.get_ref().pings(), 0);

    transport.set_failure(None);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(supervisor.get_ref().pings(), 1);
    assert!(supervisor.status().available);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(supervisor.get_ref().pings(), 1);
    assert!(!supervisor.is_recovering());
}

#[tokio::test(start_paused = true)]
async fn init_waits_for_first_success() {
    let transport = healthy_transport().fail_with(refused());
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), heartbeat(1000));

    let waited = tokio::time::timeout(Duration::from_millis(2500), supervisor.init()).await;
    assert!(waited.is_err());
    assert!(!supervisor.is_initialized());
    // Probes at 0s, 1s and 2s.
    assert_eq!(supervisor.get_ref().pings(), 3);

    transport.set_failure(None);
    supervisor.init().await;

    assert!(supervisor.is_initialized());
    assert!(supervisor.status().available);
    assert_eq!(supervisor.get_ref().pings(), 4);
}

#[tokio::test(start_paused = true)]
async fn no_recovery_after_init_without_monitor() {
    let transport = healthy_transport();
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), heartbeat(1000));
    supervisor.init().await;
    let pings = supervisor.get_ref().pings();

    transport.set_failure(Some(refused()));
    assert!(supervisor.call(|c| c.sugrec("x")).await.is_err());
    assert!(!supervisor.status().available);
    assert!(!supervisor.is_recovering());

    transport.set_failure(None);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(supervisor.get_ref().pings(), pings);
    assert!(!supervisor.status().available);

    // The next successful call restores availability.
    supervisor.call(|c| c.sugrec("x")).await.unwrap();
    assert!(supervisor.status().available);
}

#[tokio::test(start_paused = true)]
async fn monitor_recovers_after_init() {
    let transport = healthy_transport();
    let config = heartbeat(1000).with_monitor(true);
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), config);
    supervisor.init().await;

    transport.set_failure(Some(refused()));
    assert!(supervisor.call(|c| c.sugrec("x")).await.is_err());
    assert!(supervisor.is_recovering());

    transport.set_failure(None);
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(supervisor.status().available);
    assert!(!supervisor.is_recovering());
}

#[tokio::test(start_paused = true)]
async fn dropping_supervisor_stops_recovery() {
    let transport = healthy_transport().fail_with(refused());
    let supervisor = Supervisor::new(SugrecClient::new(transport.clone()), heartbeat(1000));

    assert!(supervisor.call(|c| c.sugrec("x")).await.is_err());
    drop(supervisor);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn custom_classifier_decides_outages() {
    let transport = healthy_transport();
    let classifier = |e: &Error| {
        e.as_api()
            .filter(|api| api.kind() == ErrorKind::Server)
            .map(|api| format!("server error {}", api.status().unwrap_or_default()))
    };
    let supervisor =
        Supervisor::with_classifier(SugrecClient::new(transport.clone()), heartbeat(1000), classifier);
    supervisor.ping().await.unwrap();
    supervisor.init().await;

    transport.set_failure(Some(TransportError::status(503, None)));
    assert!(supervisor.call(|c| c.sugrec("x")).await.is_err());

    let status = supervisor.status();
    assert!(!status.available);
    assert_eq!(status.message, "server error 503");
}
