//! Minimal HTTP/1.1 server that answers every request with one canned response.
//!
//! Each request target (path and query string) is recorded so tests can check what was sent.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// `Content-Length` to announce instead of the body length; a larger value simulates a
    /// connection dropped mid-body.
    pub announced_length: Option<usize>,
}

impl CannedResponse {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body: body.into(),
            announced_length: None,
        }
    }
}

pub struct StubServer {
    /// Root URL, without a trailing slash; e.g. "http://127.0.0.1:12345/api".
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(response: CannedResponse) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let response = Arc::new(response);

    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let response = Arc::clone(&response);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, &response, &recorded));
        }
    });

    StubServer {
        base_url: format!("http://127.0.0.1:{port}/api"),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    response: &CannedResponse,
    recorded: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    // read until the end of the request head
    let mut head = Vec::new();
    let mut buf = [0u8; 4096];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&head);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    recorded.lock().unwrap().push(target);

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.announced_length.unwrap_or(response.body.len())
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
}
