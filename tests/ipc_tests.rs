//! IPC socket tests
//!
//! Talks to a live server over its Unix socket the way an external client would.

mod common;

use anyhow::{Context, Result};
use common::TestService;
use floatd::ipc::{request_once, Reply, Request};
use floatd::FloatIpcServer;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::time::timeout;

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(server: &FloatIpcServer) -> Result<Self> {
        let stream = UnixStream::connect(server.socket_path()).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    async fn send_raw(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn send(&mut self, request: &Request) -> Result<()> {
        self.send_raw(&serde_json::to_string(request)?).await
    }

    async fn recv(&mut self) -> Result<Reply> {
        let line = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .context("Timed out waiting for a reply")??
            .context("Server closed the connection")?;
        Ok(serde_json::from_str(&line)?)
    }
}

async fn start_server(t: &TestService) -> Result<FloatIpcServer> {
    let server = FloatIpcServer::new(t.settings.socket_path.clone(), t.service.handle());
    server.start().await?;
    Ok(server)
}

#[tokio::test]
async fn test_server_binds_and_cleans_up_socket() -> Result<()> {
    let t = TestService::start();
    // A leftover socket file from a previous run must not block startup
    std::fs::write(&t.settings.socket_path, b"stale")?;

    let server = start_server(&t).await?;
    assert!(server.socket_path().exists());

    let path = server.socket_path().to_path_buf();
    drop(server);
    assert!(!path.exists());

    t.service.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_identity_requests() -> Result<()> {
    let t = TestService::start();
    let server = start_server(&t).await?;

    let reply = request_once(server.socket_path(), &Request::GetVersionName).await?;
    assert_eq!(
        reply,
        Reply::VersionName {
            name: floatd::VERSION_NAME.to_string()
        }
    );

    let reply = request_once(server.socket_path(), &Request::GetVersionCode).await?;
    assert_eq!(reply, Reply::VersionCode { code: floatd::VERSION_CODE });

    let reply = request_once(server.socket_path(), &Request::GetBuildTime).await?;
    assert_eq!(reply, Reply::BuildTime { millis: floatd::build_time() });

    let reply = request_once(server.socket_path(), &Request::GetUid).await?;
    assert!(matches!(reply, Reply::Uid { .. }));

    t.service.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_config_over_socket() -> Result<()> {
    let t = TestService::start();
    let server = start_server(&t).await?;
    let mut client = Client::connect(&server).await?;

    client
        .send(&Request::UpdateConfig {
            config: r#"{"version":1,"densityDpi":360}"#.to_string(),
        })
        .await?;
    assert_eq!(client.recv().await?, Reply::Ack);

    client.send(&Request::GetConfigJson).await?;
    match client.recv().await? {
        Reply::ConfigJson { config } => {
            let value: serde_json::Value = serde_json::from_str(&config)?;
            assert_eq!(value["densityDpi"], 360);
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    client
        .send(&Request::UpdateConfig {
            config: "nonsense".to_string(),
        })
        .await?;
    assert!(matches!(client.recv().await?, Reply::Error { .. }));
    assert_eq!(t.service.handle().config().current().density_dpi, 360);

    t.service.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_connection_receives_open_counts() -> Result<()> {
    let t = TestService::start();
    let server = start_server(&t).await?;
    let mut client = Client::connect(&server).await?;

    client.send(&Request::RegisterOpenCountListener).await?;
    assert_eq!(client.recv().await?, Reply::Ack);
    assert_eq!(client.recv().await?, Reply::OpenCount { count: 0 });

    client.send(&Request::CreateWindow).await?;
    // The ack and the pushed count race each other
    let mut replies = vec![client.recv().await?, client.recv().await?];
    replies.sort_by_key(|reply| matches!(reply, Reply::OpenCount { .. }));
    assert_eq!(replies, vec![Reply::Ack, Reply::OpenCount { count: 1 }]);

    client.send(&Request::UnregisterOpenCountListener).await?;
    assert_eq!(client.recv().await?, Reply::Ack);

    t.service.handle().create_window();
    t.service.handle().flush().await?;
    client.send(&Request::GetVersionCode).await?;
    assert!(matches!(client.recv().await?, Reply::VersionCode { .. }));

    t.service.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_disconnected_listener_is_dropped() -> Result<()> {
    let t = TestService::start();
    let server = start_server(&t).await?;

    let mut client = Client::connect(&server).await?;
    client.send(&Request::RegisterOpenCountListener).await?;
    assert_eq!(client.recv().await?, Reply::Ack);
    assert_eq!(client.recv().await?, Reply::OpenCount { count: 0 });
    drop(client);

    // The service keeps working for everyone else
    let handle = t.service.handle();
    handle.create_window();
    handle.flush().await?;
    assert_eq!(handle.open_count().await?, 1);

    t.service.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_signals_and_malformed_lines() -> Result<()> {
    let t = TestService::start();
    let server = start_server(&t).await?;
    let mut client = Client::connect(&server).await?;

    client.send_raw("this is not json").await?;
    assert!(matches!(client.recv().await?, Reply::Error { .. }));

    client
        .send_raw(r#"{"type":"Signal","signal":{"action":"warp-drive"}}"#)
        .await?;
    assert_eq!(client.recv().await?, Reply::Ack);

    client
        .send_raw(r#"{"type":"Signal","signal":{"action":"open-in-window","taskId":8}}"#)
        .await?;
    assert_eq!(client.recv().await?, Reply::Ack);

    let handle = t.service.handle();
    handle.flush().await?;
    assert_eq!(handle.open_count().await?, 1);
    assert_eq!(t.host.created(), 1);

    t.service.shutdown();
    Ok(())
}
