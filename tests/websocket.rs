//! Listener and receive against a local tokio-tungstenite relay.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use buoy_client::{Encoding, Listener, ListenerEvent, Message, ReceiveOptions};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

// ============================================================================
// Helpers
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

/// Binds a relay on a random localhost port and returns its service URL.
async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
        .await
        .expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    (listener, format!("http://127.0.0.1:{port}/"))
}

/// Accepts one WebSocket client, recording the request path and query.
async fn accept(
    listener: &TcpListener,
    path: Arc<Mutex<Option<String>>>,
) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client should connect")
        .expect("accept should succeed");

    tokio_tungstenite::accept_hdr_async(stream, move |request: &Request, response: Response| {
        *path.lock() = request.uri().path_and_query().map(ToString::to_string);
        Ok::<_, ErrorResponse>(response)
    })
    .await
    .expect("handshake should succeed")
}

async fn next_event(events: &mut broadcast::Receiver<ListenerEvent>) -> ListenerEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("event should arrive")
        .expect("channel should be open")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_receive_text() {
    let (relay, service) = bind().await;
    let path = Arc::new(Mutex::new(None));

    let server = tokio::spawn({
        let path = Arc::clone(&path);
        async move {
            let mut ws = accept(&relay, path).await;
            ws.send(WsMessage::text("hello")).await.expect("send");
            // Keep the socket open until the client closes it
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        }
    });

    let message = Listener::builder()
        .service(service)
        .channel("test-channel")
        .receive(ReceiveOptions::new().with_timeout(WAIT))
        .await
        .expect("receive should succeed");

    assert_eq!(message.as_text(), Some("hello"));
    timeout(WAIT, server).await.expect("relay finished").expect("relay task");
    assert_eq!(path.lock().as_deref(), Some("/test-channel?v=2"));
}

#[tokio::test]
async fn test_binary_frame_decoded_as_json() {
    let (relay, service) = bind().await;

    tokio::spawn(async move {
        let mut ws = accept(&relay, Arc::new(Mutex::new(None))).await;
        let payload = serde_json::to_vec(&json!({"foo": "bar"})).expect("json");
        ws.send(WsMessage::binary(payload)).await.expect("send");
        while ws.next().await.is_some() {}
    });

    let message = Listener::builder()
        .service(service)
        .channel("json")
        .encoding(Encoding::Json)
        .receive(ReceiveOptions::new().with_timeout(WAIT))
        .await
        .expect("receive should succeed");

    assert_eq!(message, Message::Json(json!({"foo": "bar"})));
}

#[tokio::test]
async fn test_heartbeat_ping_answered_with_pong() {
    let (relay, service) = bind().await;
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let mut ws = accept(&relay, Arc::new(Mutex::new(None))).await;
        ws.send(WsMessage::binary(vec![0x42, 0x42, 0x01, 0x05]))
            .await
            .expect("send ping");

        let reply = loop {
            match ws.next().await {
                Some(Ok(WsMessage::Binary(data))) => break data.to_vec(),
                Some(Ok(_)) => continue,
                _ => break Vec::new(),
            }
        };
        let _ = reply_tx.send(reply);

        ws.send(WsMessage::text("after")).await.expect("send");
        while ws.next().await.is_some() {}
    });

    let listener = Listener::builder()
        .service(service)
        .channel("heartbeat")
        .auto_connect(false)
        .build()
        .expect("build");
    let mut events = listener.subscribe();
    listener.connect();

    let reply = timeout(WAIT, reply_rx).await.expect("reply").expect("relay");
    assert_eq!(reply, vec![0x42, 0x42, 0x02, 0x05]);

    assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
    match next_event(&mut events).await {
        ListenerEvent::Message(message) => assert_eq!(message.as_text(), Some("after")),
        other => panic!("unexpected event: {other:?}"),
    }

    listener.disconnect();
}

#[tokio::test]
async fn test_disconnect_sends_normal_closure() {
    let (relay, service) = bind().await;
    let (code_tx, code_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let mut ws = accept(&relay, Arc::new(Mutex::new(None))).await;
        let mut code = None;
        while let Some(Ok(message)) = ws.next().await {
            if let WsMessage::Close(frame) = message {
                code = frame.map(|frame| frame.code);
                break;
            }
        }
        let _ = code_tx.send(code);
    });

    let listener = Listener::builder()
        .service(service)
        .channel("close")
        .auto_connect(false)
        .build()
        .expect("build");
    let mut events = listener.subscribe();

    listener.connect();
    assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
    assert!(listener.is_connected());

    listener.disconnect();
    assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));

    let code = timeout(WAIT, code_rx).await.expect("close").expect("relay");
    assert_eq!(code, Some(CloseCode::Normal));
    assert!(!listener.is_connected());
}

#[tokio::test]
async fn test_reconnects_after_relay_closes() {
    let (relay, service) = bind().await;

    tokio::spawn(async move {
        let mut first = accept(&relay, Arc::new(Mutex::new(None))).await;
        first.close(None).await.expect("close");
        drop(first);

        let mut second = accept(&relay, Arc::new(Mutex::new(None))).await;
        second.send(WsMessage::text("again")).await.expect("send");
        while second.next().await.is_some() {}
    });

    let listener = Listener::builder()
        .service(service)
        .channel("reconnect")
        .auto_connect(false)
        .build()
        .expect("build");
    let mut events = listener.subscribe();
    listener.connect();

    let mut seen = Vec::new();
    let message = loop {
        match next_event(&mut events).await {
            ListenerEvent::Message(message) => break message,
            ListenerEvent::Error(e) => assert!(e.is_recoverable(), "unexpected error: {e}"),
            event => seen.push(format!("{event:?}")),
        }
    };

    assert_eq!(message.as_text(), Some("again"));
    assert_eq!(seen, ["Connected", "Disconnected", "Connected"]);
    listener.disconnect();
}
