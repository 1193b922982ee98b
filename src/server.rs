//! Runtime statistics endpoint.
//!
//! Plain HTTP on a local port: any request gets a 200 with a JSON snapshot
//! of the poll/push counters. Free-running values, reset only by restart.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::stats::Stats;

pub async fn run(port: u16, stats: Arc<Stats>) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("exposing runtime statistics on port {}", port);
    serve(listener, stats).await
}

async fn serve(listener: TcpListener, stats: Arc<Stats>) -> Result<()> {
    loop {
        let (mut socket, _addr) = listener.accept().await?;
        let stats = Arc::clone(&stats);
        tokio::spawn(async move {
            // Drain whatever request line and headers arrive; the response
            // is the same regardless.
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;

            let body = stats.snapshot().to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            if let Err(err) = socket.write_all(response.as_bytes()).await {
                warn!("couldn't write statistics response: {}", err);
            }
        });
    }
}
