//! Abort and transport-failure behavior against hand-rolled TCP peers.
//!
//! The mock server always answers promptly, so these tests talk to raw
//! listeners that hang, stall mid-body, or reply with canned bytes.

use std::time::Duration;

use reservations_core::{AbortController, ApiClient, ApiError, ClientConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const DEADLINE: Duration = Duration::from_secs(5);

/// Accepts connections and never answers them.
async fn start_silent_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// Answers every connection with `response` verbatim. With `hold` set the
/// connection stays open afterwards instead of closing.
async fn start_canned_backend(response: &'static str, hold: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            if hold {
                held.push(socket);
            } else {
                let _ = socket.shutdown().await;
            }
        }
    });
    format!("http://{addr}")
}

fn abort_after(controller: &AbortController, delay: Duration) {
    let controller = controller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        controller.abort();
    });
}

#[tokio::test]
async fn abort_in_flight_list_yields_empty_list() {
    let client = ApiClient::new(ClientConfig::new(&start_silent_backend().await));
    let controller = AbortController::new();
    abort_after(&controller, Duration::from_millis(50));

    let signal = controller.signal();
    let request = client.list_reservations(&[("date", "2023-01-01")], Some(&signal));
    let listed = tokio::time::timeout(DEADLINE, request)
        .await
        .expect("abort should end the request")
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn abort_in_flight_write_yields_none() {
    let client = ApiClient::new(ClientConfig::new(&start_silent_backend().await));
    let controller = AbortController::new();
    abort_after(&controller, Duration::from_millis(50));

    let signal = controller.signal();
    let seated = tokio::time::timeout(DEADLINE, client.seat_reservation(1, 2, Some(&signal)))
        .await
        .expect("abort should end the request")
        .unwrap();
    assert!(seated.is_none());
}

#[tokio::test]
async fn abort_while_body_is_streaming_yields_fallback() {
    let base_url = start_canned_backend(
        concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n",
            "Content-Length: 200\r\n\r\n{\"data\":[",
        ),
        true,
    )
    .await;
    let client = ApiClient::new(ClientConfig::new(&base_url));
    let controller = AbortController::new();
    abort_after(&controller, Duration::from_millis(100));

    let signal = controller.signal();
    let tables = tokio::time::timeout(DEADLINE, client.list_tables(Some(&signal)))
        .await
        .expect("abort should end the request")
        .unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
async fn already_aborted_signal_short_circuits() {
    // Nothing listens on the discard port; reaching the network would fail.
    let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9"));
    let controller = AbortController::new();
    controller.abort();

    let signal = controller.signal();
    assert!(client.read_reservation(1, Some(&signal)).await.unwrap().is_none());
    assert!(client.finish_table(5, Some(&signal)).await.unwrap().is_none());
    let fallback: serde_json::Value = client
        .fetch_json(client.core().build_list_tables(), Some(&signal), serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(fallback, serde_json::json!({}));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ClientConfig::new(&format!("http://{addr}")));
    let controller = AbortController::new();
    let signal = controller.signal();
    let err = client.list_tables(Some(&signal)).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn non_json_body_is_a_deserialization_error() {
    let base_url = start_canned_backend(
        concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n",
            "Content-Length: 9\r\nConnection: close\r\n\r\nnot json!",
        ),
        false,
    )
    .await;
    let client = ApiClient::new(ClientConfig::new(&base_url));

    let err = client.list_tables(None).await.unwrap_err();
    assert!(matches!(err, ApiError::DeserializationError(_)), "got {err:?}");
}

#[tokio::test]
async fn no_content_ignores_body() {
    let base_url =
        start_canned_backend("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n", false).await;
    let client = ApiClient::new(ClientConfig::new(&base_url));

    assert!(client.list_reservations(&[("date", "2023-01-01")], None).await.unwrap().is_empty());
}

#[tokio::test]
async fn strict_status_turns_bare_errors_into_failures() {
    let response = concat!(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Type: application/json\r\n",
        "Content-Length: 2\r\nConnection: close\r\n\r\n{}",
    );

    let lenient = ApiClient::new(ClientConfig::new(&start_canned_backend(response, false).await));
    assert!(lenient.read_reservation(1, None).await.unwrap().is_none());

    let strict_url = start_canned_backend(response, false).await;
    let strict = ApiClient::new(ClientConfig::new(&strict_url).with_strict_status(true));
    let err = strict.read_reservation(1, None).await.unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 503, .. }), "got {err:?}");
}
