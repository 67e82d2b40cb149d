//! One-shot HTTP listener for exercising [`super::HttpBackend`] against real
//! sockets. Each server answers exactly one request and hands back the raw
//! request it saw.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::AdminConfig;

pub struct StubServer {
    pub cfg: AdminConfig,
    pub request: JoinHandle<String>,
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &str) -> Option<usize> {
    head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-length")
            .then(|| value.trim().parse().ok())?
    })
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = header_end(buf) else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..end]);
    match content_length(&head) {
        Some(len) => buf.len() >= end + len,
        None if head.to_ascii_lowercase().contains("transfer-encoding: chunked") => {
            buf.ends_with(b"0\r\n\r\n")
        }
        None => true,
    }
}

/// Binds an ephemeral port and replies `status` with a JSON `body`.
pub async fn serve_once(status: u16, body: &str) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let body = body.to_string();
    let request = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        while !request_complete(&buf) {
            let n = stream.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let resp = format!(
            "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(resp.as_bytes()).await.expect("write response");
        stream.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });
    let cfg = AdminConfig {
        api_url: format!("http://{addr}"),
        ..AdminConfig::default()
    };
    StubServer { cfg, request }
}
