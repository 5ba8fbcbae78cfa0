use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use proptest::prelude::*;
use reqwest::header::HeaderMap;
use wskit_http::{
    Client, HttpConfig, HttpError, Transport, TransportError, TransportReply, TransportRequest,
};

#[derive(Debug, Clone)]
enum Step {
    Fail,
    Hang,
    Invalid,
    Reply(u16, &'static str),
}

/// Plays back a fixed script; fails once the script runs out.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.clone();
        self.seen.lock().unwrap().push(request);

        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Fail);
        match step {
            Step::Fail => Err(TransportError::Connect("connection refused".into())),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Io("woke up".into()))
            }
            Step::Invalid => Err(TransportError::InvalidRequest("bad header".into())),
            Step::Reply(status, body) => Ok(TransportReply {
                status,
                url,
                headers: HeaderMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            }),
        }
    }
}

fn client(transport: Arc<ScriptedTransport>) -> Client {
    Client::with_transport(transport, HttpConfig::default())
}

fn client_with(transport: Arc<ScriptedTransport>, config: HttpConfig) -> Client {
    Client::with_transport(transport, config)
}

fn fails_then_ok(failures: u32) -> Vec<Step> {
    let mut steps = vec![Step::Fail; failures as usize];
    steps.push(Step::Reply(200, "ok"));
    steps
}

#[tokio::test]
async fn test_get_success_first_attempt() {
    let transport = ScriptedTransport::new([Step::Reply(200, r#"{"ok":true}"#)]);

    let response = client(transport.clone())
        .url("http://example/get")
        .get()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.json().unwrap(), &serde_json::json!({ "ok": true }));
    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.seen()[0].method, "GET");
}

#[tokio::test]
async fn test_get_recovers_from_transient_failures() {
    let transport = ScriptedTransport::new(fails_then_ok(3));

    let response = client(transport.clone())
        .url("http://example/get")
        .get()
        .await
        .unwrap();

    assert_eq!(response.text().unwrap(), "ok");
    assert_eq!(transport.calls(), 4);
}

#[tokio::test]
async fn test_get_defaults_to_five_attempts() {
    let transport = ScriptedTransport::new([]);

    let err = client(transport.clone())
        .url("http://example/get")
        .get()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HttpError::Transport {
            attempts: 5,
            source: TransportError::Connect(_)
        }
    ));
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn test_get_overrides_caller_max_attempts() {
    let transport = ScriptedTransport::new([]);

    let err = client(transport.clone())
        .url("http://example/get")
        .max_attempts(2)
        .get()
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(5));
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn test_status_error_is_never_retried() {
    for status in [400, 404, 500, 503] {
        let transport = ScriptedTransport::new([Step::Reply(status, "nope"), Step::Reply(200, "ok")]);

        let err = client(transport.clone())
            .url("http://example/get")
            .get()
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(status));
        assert_eq!(err.body_text().as_deref(), Some("nope"));
        assert_eq!(transport.calls(), 1);
    }
}

#[tokio::test]
async fn test_status_error_after_transport_failure() {
    let transport = ScriptedTransport::new([Step::Fail, Step::Reply(502, "bad gateway")]);

    let err = client(transport.clone())
        .url("http://example/get")
        .get()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_redirect_class_status_is_success() {
    let transport = ScriptedTransport::new([Step::Reply(304, "")]);

    let response = client(transport)
        .url("http://example/get")
        .get()
        .await
        .unwrap();

    assert_eq!(response.status(), 304);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_post_text_is_not_retried() {
    let transport = ScriptedTransport::new(fails_then_ok(1));

    let err = client(transport.clone())
        .url("http://example/post")
        .post_text("Hello World")
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(1));
    assert_eq!(transport.calls(), 1);

    let seen = transport.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].body.as_deref(), Some(&b"Hello World"[..]));
}

#[tokio::test]
async fn test_post_json_fails_on_single_transport_failure() {
    let transport = ScriptedTransport::new(fails_then_ok(1));

    let err = client(transport.clone())
        .url("http://example/post")
        .json_body(&serde_json::json!({ "planet": "World" }))
        .unwrap()
        .post()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HttpError::Transport {
            attempts: 1,
            source: TransportError::Connect(_)
        }
    ));
    assert_eq!(transport.calls(), 1);

    let request = &transport.seen()[0];
    assert_eq!(request.headers["Content-Type"], "application/json");
    let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "planet": "World" }));
}

#[tokio::test]
async fn test_post_overrides_caller_max_attempts() {
    let transport = ScriptedTransport::new(fails_then_ok(1));

    let err = client(transport.clone())
        .url("http://example/post")
        .max_attempts(4)
        .text_body("x")
        .post()
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(1));
}

#[tokio::test]
async fn test_execute_honours_max_attempts() {
    let transport = ScriptedTransport::new(fails_then_ok(2));

    let response = client(transport.clone())
        .url("http://example/put")
        .method("PUT")
        .text_body("data")
        .header("X-Request-Id", "42")
        .max_attempts(3)
        .execute()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(transport.calls(), 3);

    // Every attempt resubmits identical state.
    for request in transport.seen() {
        assert_eq!(request.method, "PUT");
        assert_eq!(request.headers["X-Request-Id"], "42");
        assert_eq!(request.body.as_deref(), Some(&b"data"[..]));
        assert_eq!(request.url.as_str(), "http://example/put");
    }
}

#[tokio::test]
async fn test_execute_defaults_to_single_attempt() {
    let transport = ScriptedTransport::new(fails_then_ok(1));

    let err = client(transport.clone())
        .url("http://example/delete")
        .method("DELETE")
        .execute()
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_invalid_request_stops_retries() {
    let transport = ScriptedTransport::new([Step::Invalid, Step::Reply(200, "ok")]);

    let err = client(transport.clone())
        .url("http://example/get")
        .get()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HttpError::Transport {
            attempts: 1,
            source: TransportError::InvalidRequest(_)
        }
    ));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_each_logical_request_counts_from_zero() {
    let transport = ScriptedTransport::new([]);
    let client = client(transport.clone());

    let first = client.url("http://example/get").get().await.unwrap_err();
    let second = client.url("http://example/get").get().await.unwrap_err();

    assert_eq!(first.attempts(), Some(5));
    assert_eq!(second.attempts(), Some(5));
    assert_eq!(transport.calls(), 10);
}

#[tokio::test]
async fn test_independent_requests_run_concurrently() {
    let ok = ScriptedTransport::new(fails_then_ok(2));
    let failing = ScriptedTransport::new([]);

    let a = client(ok.clone()).url("http://example/a").get();
    let b = client(failing.clone()).url("http://example/b").get();
    let (a, b) = tokio::join!(a, b);

    assert_eq!(a.unwrap().status(), 200);
    assert_eq!(b.unwrap_err().attempts(), Some(5));
    assert_eq!(ok.calls(), 3);
    assert_eq!(failing.calls(), 5);
}

#[tokio::test]
async fn test_request_starts_without_awaiting() {
    let transport = ScriptedTransport::new([Step::Reply(200, "ok")]);

    let pending = client(transport.clone()).url("http://example/get").get();
    tokio::time::timeout(Duration::from_secs(5), async {
        while transport.calls() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert_eq!(pending.await.unwrap().status(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_applies_per_attempt() {
    let transport = ScriptedTransport::new([Step::Hang, Step::Hang, Step::Reply(200, "ok")]);
    let start = tokio::time::Instant::now();

    let response = client(transport.clone())
        .url("http://example/slow")
        .timeout(Duration::from_millis(100))
        .get()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(transport.calls(), 3);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_exhaust_attempts() {
    let transport = ScriptedTransport::new(vec![Step::Hang; 5]);

    let err = client(transport.clone())
        .url("http://example/slow")
        .timeout(Duration::from_secs(1))
        .get()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HttpError::Transport {
            attempts: 5,
            source: TransportError::Timeout
        }
    ));
    assert_eq!(transport.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_retry_delay_between_attempts() {
    let transport = ScriptedTransport::new(fails_then_ok(2));
    let config = HttpConfig {
        retry_delay: Duration::from_secs(1),
        ..HttpConfig::default()
    };
    let start = tokio::time::Instant::now();

    let response = client_with(transport.clone(), config)
        .url("http://example/get")
        .get()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_succeeds_after_k_failures(max_attempts in 1u32..10, k in 0u32..10) {
        prop_assume!(k < max_attempts);
        let transport = ScriptedTransport::new(fails_then_ok(k));

        let result = run(async {
            client(transport.clone())
                .url("http://example/get")
                .max_attempts(max_attempts)
                .execute()
                .await
        });

        prop_assert!(result.is_ok());
        prop_assert_eq!(transport.calls(), k + 1);
    }

    #[test]
    fn prop_never_exceeds_max_attempts(max_attempts in 1u32..10) {
        let transport = ScriptedTransport::new([]);

        let result = run(async {
            client(transport.clone())
                .url("http://example/get")
                .max_attempts(max_attempts)
                .execute()
                .await
        });

        prop_assert_eq!(result.unwrap_err().attempts(), Some(max_attempts));
        prop_assert_eq!(transport.calls(), max_attempts);
    }

    #[test]
    fn prop_status_errors_use_one_attempt(max_attempts in 1u32..10, status in 400u16..600) {
        let transport = ScriptedTransport::new([Step::Reply(status, "")]);

        let result = run(async {
            client(transport.clone())
                .url("http://example/get")
                .max_attempts(max_attempts)
                .execute()
                .await
        });

        prop_assert_eq!(result.unwrap_err().status(), Some(status));
        prop_assert_eq!(transport.calls(), 1);
    }
}
