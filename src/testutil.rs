//! Local HTTP fixtures for exercising the pollers and the dispatcher
//! against a real socket instead of a mocked client.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A canned source body matching the monitoring API's summary shape.
pub const SAMPLE_BODY: &str = r#"{
    "application": {
        "id": 123456,
        "name": "web-frontend",
        "reporting": true,
        "application_summary": {
            "response_time": 42.5,
            "throughput": 1200.0,
            "error_rate": 0.25,
            "apdex_target": 0.5,
            "apdex_score": 0.93,
            "host_count": 4,
            "instance_count": 8
        }
    }
}"#;

/// One captured inbound request: the raw head plus the body text.
#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn path(&self) -> &str {
        self.head.split_whitespace().nth(1).unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head.lines().find_map(|line| {
            if line.to_ascii_lowercase().starts_with(&prefix) {
                Some(line[prefix.len()..].trim())
            } else {
                None
            }
        })
    }
}

/// Serve a canned HTTP response on an ephemeral local port.
///
/// Accepts connections until the returned receiver (and the test) is
/// dropped; every request is captured and answered with
/// `HTTP/1.1 {status_line}` plus `body`.
pub async fn spawn_server(
    status_line: &'static str,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = tx.send(request);
            });
        }
    });

    (addr, rx)
}

/// Read one request: headers up to the blank line, then the declared
/// content-length worth of body.
async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        if let Some(split) = header_end(&raw) {
            let head = String::from_utf8_lossy(&raw[..split]).to_string();
            let head_lower = head.to_ascii_lowercase();
            let content_length = head_lower
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            while raw.len() < split + 4 + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            let body = String::from_utf8_lossy(&raw[split + 4..]).to_string();
            return CapturedRequest { head, body };
        }
    }

    CapturedRequest {
        head: String::from_utf8_lossy(&raw).to_string(),
        body: String::new(),
    }
}

fn header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}
