//! A one-shot `tiny_http` stand-in for the assistant backend.

#![allow(dead_code)]

use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Response, Server};

pub struct Captured {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

pub struct MockBackend {
    pub url: String,
    received: Receiver<Captured>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Answers the first request with `status` after `delay`.
    pub fn start(status: u16, delay: Duration) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, received) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut request = match server.recv_timeout(Duration::from_secs(10)) {
                Ok(Some(request)) => request,
                _ => return,
            };
            let mut raw = String::new();
            request.as_reader().read_to_string(&mut raw).unwrap();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());

            let _ = tx.send(Captured {
                method: request.method().to_string(),
                path: request.url().to_string(),
                content_type,
                body: serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null),
            });

            thread::sleep(delay);
            let _ = request.respond(Response::from_string("{\"ok\":true}").with_status_code(status));
        });

        Self {
            url: format!("http://127.0.0.1:{}/api/eye/inject", port),
            received,
            handle,
        }
    }

    pub fn ok() -> Self {
        Self::start(200, Duration::ZERO)
    }

    /// The request the backend saw, if any arrived.
    pub fn captured(self) -> Option<Captured> {
        let captured = self.received.recv_timeout(Duration::from_secs(5)).ok();
        let _ = self.handle.join();
        captured
    }
}

/// A URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/eye/inject", port)
}
