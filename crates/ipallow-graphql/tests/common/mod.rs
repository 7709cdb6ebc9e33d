//! Minimal HTTP/1.1 server that tracks how many requests it holds at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const RESPONSE_BODY: &str = r#"{"data":{"viewer":{"id":"user-1"}}}"#;

#[derive(Debug, Default)]
struct GateState {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    arrivals: AtomicUsize,
    released_by_count: AtomicUsize,
}

/// Holds every request until `release_at` requests have arrived or `hold`
/// elapses, whichever comes first.
pub struct GateServer {
    url: String,
    state: Arc<GateState>,
}

impl GateServer {
    pub async fn start(release_at: usize, hold: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let state = Arc::new(GateState::default());

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(serve_connection(stream, state, release_at, hold));
            }
        });

        Self { url, state }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn arrivals(&self) -> usize {
        self.state.arrivals.load(Ordering::SeqCst)
    }

    /// Requests released because the arrival target was reached.
    pub fn released_by_count(&self) -> usize {
        self.state.released_by_count.load(Ordering::SeqCst)
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    state: Arc<GateState>,
    release_at: usize,
    hold: Duration,
) {
    let mut buf = Vec::new();
    loop {
        if !read_request(&mut stream, &mut buf).await {
            return;
        }

        state.arrivals.fetch_add(1, Ordering::SeqCst);
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = async {
            while state.arrivals.load(Ordering::SeqCst) < release_at {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        };
        if tokio::time::timeout(hold, gate).await.is_ok() {
            state.released_by_count.fetch_add(1, Ordering::SeqCst);
        }

        // Leave the in-flight set before the client can see the response.
        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{RESPONSE_BODY}",
            RESPONSE_BODY.len()
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Read one request (head plus body) off a keep-alive connection. Returns
/// `false` once the peer has closed.
async fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
    let mut chunk = [0_u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_head_end(buf) {
            break pos;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let total = head_end + 4 + content_length;
    while buf.len() < total {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    buf.drain(..total);
    true
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}
