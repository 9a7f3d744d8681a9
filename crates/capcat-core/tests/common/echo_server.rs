//! Minimal HTTP/1.1 server that answers every request with the raw request
//! text as the response body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Starts the server on an ephemeral port and returns its base URL.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let total = loop {
                let n = match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break None,
                    Ok(n) => n,
                };
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..end]).into_owned();
                    break Some(end + content_length(&head));
                }
            };
            let Some(total) = total else { continue };
            while buf.len() < total {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Echo: 1\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                buf.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(&buf);
        }
    });
    format!("http://{addr}")
}
