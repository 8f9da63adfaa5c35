//! End-to-end tests over a real loopback socket.

use std::net::SocketAddr;
use std::time::Duration;

use sharedvfs_client::{Console, Notifications, Outcome, VfsClient};
use sharedvfs_server::{ServerConfig, VfsServer};
use sharedvfs_types::{ChangeEvent, ErrorKind};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Start a server on an ephemeral port and return the address.
async fn start_server() -> SocketAddr {
    let server = VfsServer::bind(&ServerConfig::ephemeral()).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("server error: {e}");
        }
    });
    addr
}

async fn open(addr: SocketAddr) -> (VfsClient, Notifications) {
    VfsClient::open(&addr.ip().to_string(), addr.port())
        .await
        .expect("connect failed")
}

async fn next_event(events: &mut Notifications) -> ChangeEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notification stream closed")
}

#[tokio::test]
async fn test_connect_execute_disconnect() {
    let addr = start_server().await;
    let (client, _events) = open(addr).await;

    let info = client.connect("alice").await.unwrap();
    assert_eq!(info.user_name, "alice");
    assert_eq!(info.total_sessions, 1);

    assert_eq!(
        client.execute("md docs").await.unwrap(),
        "Directory 'C:\\docs' created."
    );
    assert_eq!(
        client.execute("mf docs\\a.txt").await.unwrap(),
        "File 'C:\\docs\\a.txt' created."
    );
    assert_eq!(
        client.execute("print").await.unwrap(),
        "C:\n| |_docs [DIR]\n| | |_a.txt [FILE]"
    );

    assert_eq!(client.disconnect().await.unwrap(), "alice");
    assert!(client.credentials().is_none());
}

#[tokio::test]
async fn test_domain_errors_cross_the_wire() {
    let addr = start_server().await;
    let (client, _events) = open(addr).await;
    client.connect("alice").await.unwrap();

    let err = client.execute("rd nowhere").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::PathNotFound));

    let err = client.execute("frobnicate").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidCommand));

    client.execute("mf a.txt").await.unwrap();
    let err = client.execute("MF A.TXT").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::DuplicateName));
}

#[tokio::test]
async fn test_single_session_per_user() {
    let addr = start_server().await;
    let (first, _e1) = open(addr).await;
    let (second, _e2) = open(addr).await;

    first.connect("alice").await.unwrap();
    let err = second.connect("alice").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyConnected));

    first.disconnect().await.unwrap();
    let info = second.connect("alice").await.unwrap();
    assert_eq!(info.total_sessions, 1);
}

#[tokio::test]
async fn test_notification_reaches_others_only() {
    let addr = start_server().await;
    let (alice, mut alice_events) = open(addr).await;
    let (bob, mut bob_events) = open(addr).await;
    alice.connect("alice").await.unwrap();
    let info = bob.connect("bob").await.unwrap();
    assert_eq!(info.total_sessions, 2);

    alice.execute("md shared").await.unwrap();
    assert_eq!(
        next_event(&mut bob_events).await,
        ChangeEvent::new("alice", "md shared")
    );

    // Bob's own change is the next thing Alice hears; her own never echoes.
    bob.execute("mf shared\\b.txt").await.unwrap();
    assert_eq!(
        next_event(&mut alice_events).await,
        ChangeEvent::new("bob", "mf shared\\b.txt")
    );
    assert!(alice_events.try_recv().is_none());
}

#[tokio::test]
async fn test_read_only_commands_are_not_broadcast() {
    let addr = start_server().await;
    let (alice, _a) = open(addr).await;
    let (bob, mut bob_events) = open(addr).await;
    alice.connect("alice").await.unwrap();
    bob.connect("bob").await.unwrap();

    alice.execute("print").await.unwrap();
    alice.execute("cd C:").await.unwrap();
    alice.execute("md marker").await.unwrap();

    // The first event Bob sees is the mkdir.
    assert_eq!(next_event(&mut bob_events).await.command_line, "md marker");
}

#[tokio::test]
async fn test_dropped_connection_invalidates_session() {
    let addr = start_server().await;
    let (observer, _o) = open(addr).await;
    observer.connect("observer").await.unwrap();

    {
        let (alice, _events) = open(addr).await;
        alice.connect("alice").await.unwrap();
    }

    // The name frees up once the server notices the socket closed.
    let (again, _events) = open(addr).await;
    for _ in 0..200 {
        match again.connect("alice").await {
            Ok(_) => return,
            Err(e) if e.kind() == Some(ErrorKind::AlreadyConnected) => {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
    panic!("session for 'alice' was never invalidated");
}

#[tokio::test]
async fn test_malformed_line_does_not_kill_connection() {
    let addr = start_server().await;
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"this is not json\n").await.unwrap();
    stream
        .write_all(b"{\"id\":1,\"request\":{\"type\":\"connect\",\"user_name\":\"raw\"}}\n")
        .await
        .unwrap();

    let mut lines = BufReader::new(stream).lines();
    let first = lines.next_line().await.unwrap().unwrap();
    assert!(first.contains("\"type\":\"malformed\""), "{first}");
    let second = lines.next_line().await.unwrap().unwrap();
    assert!(second.contains("\"type\":\"connected\""), "{second}");
}

#[tokio::test]
async fn test_console_flow() {
    let addr = start_server().await;
    let (client, _events) = open(addr).await;
    let console = Console::new(client);

    assert_eq!(
        console.handle_line("md docs").await,
        Outcome::Continue(vec![
            "Please connect to the host before sending to it any other commands.".into()
        ])
    );
    assert_eq!(
        console.handle_line("connect").await,
        Outcome::Continue(vec!["User name not specified.".into()])
    );
    assert_eq!(
        console.handle_line("CONNECT alice").await,
        Outcome::Continue(vec![
            "User 'alice' connected successfully.".into(),
            "Total users: 1.".into()
        ])
    );
    assert_eq!(
        console.handle_line("connect bob").await,
        Outcome::Continue(vec![
            "Please disconnect current user ('alice') before connecting a new user.".into()
        ])
    );
    assert_eq!(
        console.handle_line("md docs").await,
        Outcome::Continue(vec!["Directory 'C:\\docs' created.".into()])
    );
    assert_eq!(console.handle_line("   ").await, Outcome::Continue(vec![]));
    assert_eq!(
        console.handle_line("quit").await,
        Outcome::Exit(vec!["User 'alice' disconnected.".into()])
    );
    assert_eq!(
        console.handle_line("md more").await,
        Outcome::Continue(vec![
            "Please connect to the host before sending to it any other commands.".into()
        ])
    );
}

#[tokio::test]
async fn test_console_disconnect_without_user() {
    let addr = start_server().await;
    let (client, _events) = open(addr).await;
    let console = Console::new(client);
    assert_eq!(
        console.handle_line("disconnect").await,
        Outcome::Continue(vec!["Current user is undefined.".into()])
    );
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let addr = start_server().await;
    let (alice, _a) = open(addr).await;
    alice.connect("alice").await.unwrap();

    let forged = sharedvfs_types::SessionToken::new();
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let line = format!(
        "{{\"id\":9,\"request\":{{\"type\":\"execute\",\"user_name\":\"alice\",\"token\":\"{forged}\",\"command_line\":\"md evil\"}}}}\n"
    );
    stream.write_all(line.as_bytes()).await.unwrap();

    let mut lines = BufReader::new(stream).lines();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert!(reply.contains("\"kind\":\"invalid_session\""), "{reply}");
    assert!(reply.contains("\"id\":9"), "{reply}");

    let err = alice.execute("rd evil").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::PathNotFound));
}
