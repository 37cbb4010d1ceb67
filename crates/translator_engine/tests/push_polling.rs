use std::sync::Mutex;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use translator_engine::push::SessionEnd;
use translator_engine::{
    EngineEvent, EventSink, LogPayload, PollingTransport, ProgressPayload, PushEvent,
    PushSettings, StagePayload,
};
use translator_engine::PushTransport;
use wiremock::matchers::{body_string, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<PushEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<PushEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::Push(event) = event {
            self.events.lock().unwrap().push(event);
        }
    }
}

const OPEN: &str =
    r#"0{"sid":"s1","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

fn open_payload(sid: &str) -> String {
    OPEN.replace(r#""sid":"s1""#, &format!(r#""sid":"{sid}""#))
}

/// Handshake for `sid`, then a namespace connect, then quiet long-polls.
async fn mount_session(server: &MockServer, sid: &str) {
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param_is_missing("sid"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(open_payload(sid), "text/plain"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", sid))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"40{"sid":"ns"}"#, "text/plain"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", sid))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("6", "text/plain")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(server)
        .await;
}

async fn expect_post(server: &MockServer, sid: &str, body: &str) {
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(query_param("sid", sid))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(server)
        .await;
}

async fn accept_other_posts(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

fn transport_for(server: &MockServer) -> PollingTransport {
    PollingTransport::new(PushSettings {
        url: server.uri(),
        poll_timeout: Duration::from_secs(5),
        ..PushSettings::default()
    })
    .expect("transport")
}

async fn mount_open(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("EIO", "4"))
        .and(query_param("transport", "polling"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(OPEN, "text/plain"))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn session_joins_task_and_forwards_events() {
    let server = MockServer::start().await;
    mount_open(&server).await;
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .and(body_string(r#"42["join",{"task_id":"task-1"}]"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let payload = [
        r#"40{"sid":"ns1"}"#,
        "2",
        r#"42["log",{"timestamp":"10:00:01","message":"📥 Receiving translation...","level":"progress","update_last":true}]"#,
        r#"42["progress",{"overall":50,"chunk":20,"current_chunk":2,"total_chunks":4}]"#,
        r#"42["model_info",{}]"#,
        r#"42["stage",{"stage":"completed"}]"#,
    ]
    .join("\u{1e}");
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(payload, "text/plain"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("1", "text/plain"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let (_join_tx, mut joins) = watch::channel(Some("task-1".to_string()));
    let cancel = CancellationToken::new();
    let sink = TestSink::default();

    let handshake = transport.open().await.expect("open");
    assert_eq!(handshake.sid, "s1");
    let end = transport
        .run_session(&handshake, &mut joins, &cancel, &sink)
        .await
        .expect("session");

    assert_eq!(end, SessionEnd::ClosedByServer);
    assert_eq!(
        sink.take(),
        vec![
            PushEvent::Connected,
            PushEvent::Log(LogPayload {
                message: "📥 Receiving translation...".to_string(),
                level: "progress".to_string(),
                timestamp: Some("10:00:01".to_string()),
                update_last: true,
            }),
            PushEvent::Progress(ProgressPayload {
                overall: 50.0,
                chunk: 20.0,
                current_chunk: 2,
                total_chunks: 4,
            }),
            PushEvent::Stage(StagePayload {
                stage: "completed".to_string(),
                message: None,
            }),
        ]
    );
}

#[tokio::test]
async fn cancellation_interrupts_a_pending_poll() {
    let server = MockServer::start().await;
    mount_open(&server).await;
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("6", "text/plain")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let (_join_tx, mut joins) = watch::channel(None::<String>);
    let cancel = CancellationToken::new();
    let sink = TestSink::default();
    let handshake = transport.open().await.expect("open");

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let end = tokio::time::timeout(
        Duration::from_secs(2),
        transport.run_session(&handshake, &mut joins, &cancel, &sink),
    )
    .await
    .expect("cancelled before the poll returned")
    .expect("session");
    assert_eq!(end, SessionEnd::Cancelled);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn open_rejects_non_handshake_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/socket.io/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("42[\"log\",{}]", "text/plain"))
        .mount(&server)
        .await;

    let err = transport_for(&server).open().await.unwrap_err();
    assert!(err.to_string().starts_with("handshake failed"));
}

#[tokio::test]
async fn task_change_closes_the_session() {
    let server = MockServer::start().await;
    mount_session(&server, "s1").await;
    expect_post(&server, "s1", r#"42["join",{"task_id":"task-1"}]"#).await;
    expect_post(&server, "s1", "1").await;
    accept_other_posts(&server).await;

    let transport = transport_for(&server);
    let (join_tx, mut joins) = watch::channel(Some("task-1".to_string()));
    let cancel = CancellationToken::new();
    let sink = TestSink::default();
    let handshake = transport.open().await.expect("open");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = join_tx.send(Some("task-2".to_string()));
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(join_tx);
    });

    let end = tokio::time::timeout(
        Duration::from_secs(2),
        transport.run_session(&handshake, &mut joins, &cancel, &sink),
    )
    .await
    .expect("session ended on task change")
    .expect("session");
    assert_eq!(end, SessionEnd::TaskChanged);
    assert_eq!(sink.take(), vec![PushEvent::Connected]);
    server.verify().await;
}

#[tokio::test]
async fn new_task_is_joined_on_a_fresh_session() {
    let server = MockServer::start().await;
    mount_session(&server, "s1").await;
    mount_session(&server, "s2").await;
    expect_post(&server, "s1", r#"42["join",{"task_id":"task-1"}]"#).await;
    expect_post(&server, "s1", "1").await;
    expect_post(&server, "s2", r#"42["join",{"task_id":"task-2"}]"#).await;
    Mock::given(method("POST"))
        .and(path("/socket.io/"))
        .and(query_param("sid", "s1"))
        .and(body_string(r#"42["join",{"task_id":"task-2"}]"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(0)
        .mount(&server)
        .await;
    accept_other_posts(&server).await;

    let transport = transport_for(&server);
    let (join_tx, joins) = watch::channel(Some("task-1".to_string()));
    let cancel = CancellationToken::new();
    let sink = TestSink::default();

    let driver = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        join_tx.send(Some("task-2".to_string())).expect("receiver alive");
        tokio::time::sleep(Duration::from_millis(700)).await;
        cancel.cancel();
    };
    tokio::time::timeout(
        Duration::from_secs(4),
        async { tokio::join!(transport.run(joins, cancel.clone(), &sink), driver) },
    )
    .await
    .expect("transport stopped after cancel");

    assert_eq!(
        sink.take(),
        vec![PushEvent::Connected, PushEvent::Connected, PushEvent::Disconnected]
    );
    server.verify().await;
}
