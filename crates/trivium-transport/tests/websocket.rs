//! Integration tests for the WebSocket transport, over real sockets.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    use trivium_transport::{Connection, Transport, WebSocketTransport};

    async fn connect_client(
        addr: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    /// Binds to an OS-assigned port and returns the transport plus the
    /// address clients should dial.
    async fn bind_ephemeral() -> (WebSocketTransport, String) {
        let transport =
            WebSocketTransport::bind("127.0.0.1:0").await.expect("should bind");
        let addr = transport.local_addr().expect("bound address").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_accept_and_exchange_text() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // Server sends; the client sees a text frame (JSON payloads).
        server_conn.send(br#"{"type":"ROOM_CLOSED"}"#).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        let Message::Text(text) = msg else {
            panic!("expected a text frame, got {msg:?}");
        };
        assert_eq!(text.as_str(), r#"{"type":"ROOM_CLOSED"}"#);

        // Client sends; the server receives the bytes.
        client_ws
            .send(Message::text(r#"{"type":"START_GAME"}"#))
            .await
            .unwrap();
        let received = server_conn.recv().await.unwrap().expect("data");
        assert_eq!(received, br#"{"type":"START_GAME"}"#);

        server_conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        // Park a reader on a clone of the connection, then push a
        // message out — the write half must not wait for the reader.
        let reader = server_conn.clone();
        let reader_handle = tokio::spawn(async move { reader.recv().await });

        tokio::task::yield_now().await;
        server_conn.send(br#"{"type":"ROOM_CLOSED"}"#).await.unwrap();

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.to_text().unwrap(), r#"{"type":"ROOM_CLOSED"}"#);

        client_ws.send(Message::text("bye")).await.unwrap();
        let received = reader_handle.await.unwrap().unwrap().expect("data");
        assert_eq!(received, b"bye");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_close_with_delivers_application_code() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        server_conn.close_with(4404, "room not found").await.unwrap();

        // The client sees the close frame with our code and reason.
        loop {
            match client_ws.next().await {
                Some(Ok(Message::Close(Some(frame)))) => {
                    assert_eq!(u16::from(frame.code), 4404);
                    assert_eq!(frame.reason.as_str(), "room not found");
                    break;
                }
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    }
}
