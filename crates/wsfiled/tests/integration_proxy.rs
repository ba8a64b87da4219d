//! Proxy-path tests against a local mock HTTP upstream:
//! - plain and gzip-encoded upstream bodies
//! - the response cache serving repeated requests with a single upstream hit

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use wsfile_proto::packet::decode_packet;
use wsfiled::ServerState;
use wsfiled::net::ws::run_listener;
use wsfiled::source::fetch_url;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Minimal HTTP/1.1 upstream: answers every GET with a fixed body and counts
/// requests (not connections, so keep-alive reuse is counted correctly).
async fn spawn_upstream(body: Vec<u8>, gzip: bool) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let listener_hits = hits.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            tokio::spawn(serve_requests(stream, body.clone(), gzip, listener_hits.clone()));
        }
    });

    (addr, hits)
}

async fn serve_requests(mut stream: TcpStream, body: Vec<u8>, gzip: bool, hits: Arc<AtomicUsize>) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = match stream.read(&mut tmp).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&tmp[..n]);

        while let Some(end) = find_header_end(&buf) {
            buf.drain(..end);
            hits.fetch_add(1, Ordering::SeqCst);

            let mut resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: keep-alive\r\n",
                body.len()
            );
            if gzip {
                resp.push_str("Content-Encoding: gzip\r\n");
            }
            resp.push_str("\r\n");

            if stream.write_all(resp.as_bytes()).await.is_err()
                || stream.write_all(&body).await.is_err()
            {
                return;
            }
        }
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn gzip_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

async fn run_mock_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Err(e) = run_listener(listener, ServerState::new()).await {
            eprintln!("Server error: {}", e);
        }
    });

    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{}/", addr);
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("Connect failed");
    ws
}

async fn next_binary(ws: &mut Client) -> Bytes {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .expect("websocket error");
        match msg {
            Message::Binary(data) => return data,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {:?}", other),
        }
    }
}

#[tokio::test]
async fn fetch_url_passes_plain_bodies_through() {
    let (addr, hits) = spawn_upstream(b"hello upstream".to_vec(), false).await;
    let client = reqwest::Client::new();

    let body = fetch_url(&client, &format!("http://{}/x", addr))
        .await
        .unwrap();
    assert_eq!(body.as_ref(), b"hello upstream");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_url_inflates_gzip_bodies() {
    let plain = b"inflate me, I was compressed in transit".to_vec();
    let (addr, _) = spawn_upstream(gzip_compress(&plain), true).await;
    let client = reqwest::Client::new();

    let body = fetch_url(&client, &format!("http://{}/x", addr))
        .await
        .unwrap();
    assert_eq!(body.as_ref(), plain.as_slice());
}

#[tokio::test]
async fn proxied_resource_is_cached_across_commands() {
    let (upstream, hits) = spawn_upstream(b"0123456789".to_vec(), false).await;
    let addr = run_mock_server().await;
    let mut ws = connect(addr).await;

    let url = format!("http://{}/x.json", upstream);

    // Sync mode: one 10-byte data message, then the zero-length terminator.
    ws.send(Message::Text(format!("GET {}", url).into()))
        .await
        .unwrap();
    let data = next_binary(&mut ws).await;
    assert_eq!(data.as_ref(), b"0123456789");
    assert!(next_binary(&mut ws).await.is_empty());

    // Same resource again, now framed on channel 4: served from the cache.
    ws.send(Message::Text(format!("GET 4 {}", url).into()))
        .await
        .unwrap();
    let frame = next_binary(&mut ws).await;
    let (header, payload) = decode_packet(&frame).unwrap();
    assert_eq!(header.channel, 4);
    assert_eq!(header.seq, 1);
    assert_eq!(payload, b"0123456789");

    let frame = next_binary(&mut ws).await;
    let (header, payload) = decode_packet(&frame).unwrap();
    assert_eq!(header.seq, 2);
    assert!(payload.is_empty());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
