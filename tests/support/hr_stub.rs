//! Minimal scripted HTTP stub standing in for the HR service.
//!
//! Each route carries a sequence of canned responses; once the sequence is
//! exhausted the last response repeats. Unknown paths answer 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

pub struct StubResponse {
    status_line: String,
    body: String,
}

impl StubResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_line: "HTTP/1.1 200 OK".to_string(),
            body: body.into(),
        }
    }

    pub fn status(code: u16, body: impl Into<String>) -> Self {
        let reason = match code {
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Error",
        };
        Self {
            status_line: format!("HTTP/1.1 {code} {reason}"),
            body: body.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_line,
            self.body.len(),
            self.body
        )
    }
}

/// Spawn the stub on an ephemeral port and return its base URL. The serving
/// thread is detached and lives until the test process exits.
pub fn serve(routes: Vec<(&str, Vec<StubResponse>)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    let routes: HashMap<String, Vec<StubResponse>> = routes
        .into_iter()
        .map(|(path, responses)| (path.to_string(), responses))
        .collect();

    thread::spawn(move || {
        let mut served: HashMap<String, usize> = HashMap::new();
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let read = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..read]).into_owned();
            let path = request
                .split_whitespace()
                .nth(1)
                .unwrap_or("/")
                .to_string();

            let response = match routes.get(&path) {
                Some(responses) => {
                    let index = served.entry(path).or_insert(0);
                    let response = &responses[(*index).min(responses.len() - 1)];
                    *index += 1;
                    response.render()
                }
                None => StubResponse::status(404, "{\"error\":\"no such route\"}").render(),
            };
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}
