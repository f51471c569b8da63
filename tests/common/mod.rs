#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use planner_core::{
    config::ConfigManager,
    model::{Account, CategoryTree, Simulation, Variable},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a config manager backed by a unique directory for each test.
pub fn setup_config_manager() -> ConfigManager {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    ConfigManager::with_base_dir(base).expect("create config manager for temp dir")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn accounts() -> Vec<Account> {
    vec![
        Account::new("chk", "Checking"),
        Account::new("sav", "Savings"),
    ]
}

pub fn categories() -> CategoryTree {
    let mut categories = CategoryTree::new();
    categories.insert("Housing", "Rent");
    categories.insert("Income", "Salary");
    categories.insert("Banking", "Transfer");
    categories.insert("Banking", "Interest");
    categories
}

pub fn raise_simulation() -> Simulation {
    Simulation::new("Default")
        .with_variable("RENT", Variable::Amount(-1450.0))
        .with_variable("RAISE", Variable::Amount(0.03))
        .with_variable("LEASE_END", Variable::Date(date(2025, 6, 30)))
}

/// One request as the stub server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string.
    pub target: String,
    pub body: String,
}

/// Loopback HTTP server answering queued responses in order, one per connection.
pub struct StubServer {
    pub base_url: String,
    requests: mpsc::Receiver<RecordedRequest>,
}

impl StubServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let (sender, requests) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    return;
                }
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let target = parts.next().unwrap_or_default().to_string();

                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    let read = reader.read_line(&mut header).unwrap_or(0);
                    if read == 0 || header == "\r\n" {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }
                let mut payload = vec![0u8; content_length];
                if reader.read_exact(&mut payload).is_err() {
                    return;
                }
                let _ = sender.send(RecordedRequest {
                    method,
                    target,
                    body: String::from_utf8_lossy(&payload).into_owned(),
                });

                let response = format!(
                    "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        Self { base_url, requests }
    }

    pub fn next_request(&self) -> RecordedRequest {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("stub server received a request")
    }
}
