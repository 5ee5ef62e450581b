//! Canned HTTP server for exercising the real clients in unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as the server saw it
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    /// `"POST /store"`
    pub route: String,
    pub body: String,
}

/// Answers each `"METHOD /path"` with a fixed status and body; unknown routes get 404
pub(crate) struct CannedServer {
    routes: HashMap<String, (u16, String)>,
}

/// Handle to a running `CannedServer`
pub(crate) struct RunningServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl RunningServer {
    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, route: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.route == route).collect()
    }
}

impl CannedServer {
    pub(crate) fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    pub(crate) fn route(mut self, route: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(route.to_string(), (status, body.into()));
        self
    }

    /// Bind an ephemeral port and serve until the test runtime shuts down
    pub(crate) async fn spawn(self) -> RunningServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let routes = Arc::new(self.routes);
        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &log).await;
                });
            }
        });

        RunningServer {
            url: format!("http://{}", addr),
            requests,
        }
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<String, (u16, String)>,
    log: &Mutex<Vec<Recorded>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    // "POST /store HTTP/1.1" -> "POST /store"
    let route = head
        .lines()
        .next()
        .unwrap_or_default()
        .rsplit_once(' ')
        .map(|(route, _)| route.to_string())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    log.lock().unwrap().push(Recorded { route: route.clone(), body });

    let (status, reply) = routes
        .get(&route)
        .cloned()
        .unwrap_or((404, String::from("{\"error\": \"not found\"}")));
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");

    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        reason,
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
