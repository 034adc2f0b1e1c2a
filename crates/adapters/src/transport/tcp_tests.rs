use super::*;
use crate::transport::adapter::Base64JsonDecodeAdapter;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bridge_core::sink::RecordingSink;
use std::time::Duration;

#[tokio::test]
async fn accepts_connection_and_forwards_decoded_payload() {
    let transport = TcpLocalTransport::new("127.0.0.1:0".parse().unwrap());
    transport.connect().await.unwrap();
    let bound_addr = {
        let guard = transport.listener.lock().await;
        guard.as_ref().unwrap().local_addr().unwrap()
    };

    let recording = Arc::new(RecordingSink::new());
    let sink = Arc::new(AdapterSink::new(Arc::new(Base64JsonDecodeAdapter), recording.clone()));
    let cancel = CancellationToken::new();
    let listen_cancel = cancel.clone();
    let listen = tokio::spawn(async move { transport.do_listen(sink, listen_cancel).await });

    let mut client = TcpStream::connect(bound_addr).await.unwrap();
    let payload = BASE64.encode(b"hello");
    client.write_all(payload.as_bytes()).await.unwrap();
    client.write_all(b"\n").await.unwrap();
    drop(client);

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    listen.await.unwrap().unwrap();

    assert_eq!(recording.received(), vec![b"hello".to_vec()]);
}

#[tokio::test]
async fn shut_line_triggers_cancellation() {
    let transport = TcpLocalTransport::new("127.0.0.1:0".parse().unwrap());
    transport.connect().await.unwrap();
    let bound_addr = {
        let guard = transport.listener.lock().await;
        guard.as_ref().unwrap().local_addr().unwrap()
    };

    let recording = Arc::new(RecordingSink::new());
    let sink = Arc::new(AdapterSink::new(Arc::new(Base64JsonDecodeAdapter), recording.clone()));
    let cancel = CancellationToken::new();
    let listen_cancel = cancel.clone();
    let listen = tokio::spawn(async move { transport.do_listen(sink, listen_cancel).await });

    let mut client = TcpStream::connect(bound_addr).await.unwrap();
    client.write_all(b"shut\n").await.unwrap();
    drop(client);

    listen.await.unwrap().unwrap();
    assert!(cancel.is_cancelled());
}
