//! Minimal HTTP/1.1 server for pipeline integration tests
//!
//! Serves static routes by path. Each route either declares its length with
//! `Content-Length` or is delimited by closing the connection. Unknown paths
//! answer 404. Every request line is recorded so tests can check the query
//! the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub body: Vec<u8>,
    /// Send `Content-Length`; otherwise the body ends when the socket closes
    pub with_length: bool,
    /// Split the body into writes of this size
    pub chunk_size: usize,
    /// Pause before each write
    pub delay: Duration,
}

impl Route {
    pub fn sized(body: Vec<u8>) -> Self {
        Self {
            body,
            with_length: true,
            chunk_size: 4096,
            delay: Duration::ZERO,
        }
    }

    pub fn without_length(body: Vec<u8>) -> Self {
        Self {
            body,
            with_length: false,
            chunk_size: 4096,
            delay: Duration::ZERO,
        }
    }

    /// Trickle the body out in `chunk_size` writes, `delay` apart
    pub fn throttled(mut self, chunk_size: usize, delay: Duration) -> Self {
        self.chunk_size = chunk_size;
        self.delay = delay;
        self
    }
}

/// Running test server
pub struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Start serving `routes` (path -> route) on an ephemeral port
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: HashMap<String, Route> = routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect();
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&log);
                thread::spawn(move || handle(stream, &routes, &log));
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    /// Absolute URL for `path_and_query`
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Request targets seen so far (path plus query)
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("/");
    let Some(route) = routes.get(path) else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    };

    let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n");
    if route.with_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for chunk in route.body.chunks(route.chunk_size.max(1)) {
        if !route.delay.is_zero() {
            thread::sleep(route.delay);
        }
        if stream.write_all(chunk).is_err() {
            return;
        }
        let _ = stream.flush();
    }
    let _ = stream.shutdown(std::net::Shutdown::Write);
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// XOR the head of `data` with `keystream`
pub fn encrypt(data: &[u8], keystream: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    for (byte, key) in out.iter_mut().zip(keystream) {
        *byte ^= key;
    }
    out
}
