//! End-to-end tests over real loopback TCP: port selection, the discovery
//! file, one-at-a-time sessions and shutdown cleanup.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use playstyle_core::SqliteAnalyzer;
use playstyle_core::config::ServerConfig;
use playstyle_server::Service;
use playstyle_server::port::read_port_file;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;

fn config(dir: &Path, start_port: u16, width: u16) -> ServerConfig {
    ServerConfig {
        start_port,
        port_scan_width: width,
        port_file: dir.join("data").join("ai_port.txt"),
        ..ServerConfig::default()
    }
}

/// A port that was free a moment ago, with `extra` free-looking ports after it.
fn free_port_window(extra: u16) -> u16 {
    loop {
        let l = std::net::TcpListener::bind("127.0.0.1:0").expect("scout");
        let port = l.local_addr().expect("addr").port();
        if port.checked_add(extra).is_some() {
            return port;
        }
    }
}

async fn round_trip(stream: &mut TcpStream, request: &[u8]) -> Value {
    stream.write_all(request).await.expect("write");
    let mut line = String::new();
    let mut reader = BufReader::new(&mut *stream);
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("response within timeout")
        .expect("read");
    serde_json::from_str(&line).expect("json")
}

#[tokio::test]
async fn publishes_bound_port_and_removes_it_on_shutdown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), free_port_window(10), 10);
    let analyzer = Arc::new(SqliteAnalyzer::new(dir.path().join("missing.db")));

    let service = Service::bind(&cfg, analyzer).expect("bind");
    let port = service.port();
    assert_eq!(read_port_file(&cfg.port_file).expect("port file"), port);

    let (tx, rx) = watch::channel(false);
    let running = tokio::spawn(service.run(rx));

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    let pong = round_trip(&mut stream, b"{\"type\":\"PING\"}\n").await;
    assert_eq!(pong["type"], "PONG");

    tx.send(true).expect("signal");
    let snapshot = running.await.expect("join");
    assert_eq!(snapshot.connections_accepted, 1);
    assert_eq!(snapshot.messages_dispatched, 1);
    assert!(!cfg.port_file.exists(), "port file removed on shutdown");
}

#[tokio::test]
async fn occupied_start_port_publishes_next_free_port() {
    let dir = tempfile::tempdir().expect("tempdir");
    let squatter = std::net::TcpListener::bind("127.0.0.1:0").expect("squatter");
    let taken = squatter.local_addr().expect("addr").port();
    if taken.checked_add(10).is_none() {
        return;
    }

    let cfg = config(dir.path(), taken, 10);
    let service = Service::bind(&cfg, Arc::new(SqliteAnalyzer::new("missing.db"))).expect("bind");

    assert_ne!(service.port(), taken);
    assert_eq!(read_port_file(&cfg.port_file).expect("port file"), service.port());

    let (tx, rx) = watch::channel(false);
    tx.send(true).expect("signal");
    service.run(rx).await;
    assert!(!cfg.port_file.exists());
}

#[tokio::test]
async fn exhausted_window_is_a_startup_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let squatter = std::net::TcpListener::bind("127.0.0.1:0").expect("squatter");
    let taken = squatter.local_addr().expect("addr").port();

    let cfg = config(dir.path(), taken, 1);
    let err = Service::bind(&cfg, Arc::new(SqliteAnalyzer::new("missing.db")))
        .expect_err("no port");
    assert_eq!(err.class(), playstyle_server::ErrorClass::Startup);
    assert!(!cfg.port_file.exists());
}

#[tokio::test]
async fn next_client_is_served_after_previous_disconnects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), free_port_window(10), 10);
    let service = Service::bind(&cfg, Arc::new(SqliteAnalyzer::new("missing.db"))).expect("bind");
    let port = service.port();

    let (tx, rx) = watch::channel(false);
    let running = tokio::spawn(service.run(rx));

    let mut first = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    assert_eq!(round_trip(&mut first, b"{\"type\":\"PING\"}\n").await["type"], "PONG");

    // Queued in the backlog until the first session ends.
    let mut second = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    second
        .write_all(b"{\"type\":\"PING\"}\n")
        .await
        .expect("write");
    let mut line = String::new();
    let early = tokio::time::timeout(
        Duration::from_millis(200),
        BufReader::new(&mut second).read_line(&mut line),
    )
    .await;
    assert!(early.is_err(), "second client must wait for the first");

    drop(first);
    let mut reader = BufReader::new(&mut second);
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("served after first disconnects")
        .expect("read");
    let pong: Value = serde_json::from_str(&line).expect("json");
    assert_eq!(pong["type"], "PONG");

    tx.send(true).expect("signal");
    let snapshot = running.await.expect("join");
    assert_eq!(snapshot.connections_accepted, 2);
    assert!(!cfg.port_file.exists());
}

#[tokio::test]
async fn client_reset_mid_frame_does_not_stop_the_service() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), free_port_window(10), 10);
    let service = Service::bind(&cfg, Arc::new(SqliteAnalyzer::new("missing.db"))).expect("bind");
    let port = service.port();

    let (tx, rx) = watch::channel(false);
    let running = tokio::spawn(service.run(rx));

    let mut first = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    assert_eq!(round_trip(&mut first, b"{\"type\":\"PING\"}\n").await["type"], "PONG");
    first.write_all(b"{\"type\":\"PI").await.expect("partial write");
    // Zero linger turns the close into a RST.
    #[allow(deprecated)]
    first.set_linger(Some(Duration::ZERO)).expect("linger");
    drop(first);

    let mut second = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    assert_eq!(round_trip(&mut second, b"{\"type\":\"PING\"}\n").await["type"], "PONG");

    tx.send(true).expect("signal");
    let snapshot = running.await.expect("join");
    assert_eq!(snapshot.connections_accepted, 2);
    assert_eq!(snapshot.messages_dispatched, 2);
    assert!(!cfg.port_file.exists());
}
