//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, Response, StatusCode},
};
use gh_relay::proxy::{RedirectPolicy, Upstream, UpstreamError, UpstreamRequest};
use gh_relay::{HttpServer, ProxyConfig};
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Canned upstream answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    },
    /// Transport failure before any response exists.
    Fail,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Respond {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Reply::Respond {
            status: 302,
            headers: vec![("location", location.to_string())],
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.push((name, value.to_string()));
        }
        self
    }
}

/// One upstream exchange as seen by the mock.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub redirect: RedirectPolicy,
}

/// Upstream that records calls and answers from a queue.
///
/// Once the queue is empty it keeps answering with `fallback`.
pub struct MockUpstream {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

impl MockUpstream {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: Reply::ok("ok"),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn repeating(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<Response<Body>, UpstreamError> {
        let body = match request.body {
            Some(body) => body.collect().await.unwrap().to_bytes().to_vec(),
            None => Vec::new(),
        };
        self.calls.lock().unwrap().push(Call {
            method: request.method,
            url: request.url.to_string(),
            headers: request.headers,
            body,
            redirect: request.redirect,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Respond {
                status,
                headers,
                body,
            } => {
                let mut builder = Response::builder().status(StatusCode::from_u16(status).unwrap());
                for (name, value) in headers {
                    builder = builder.header(name, value);
                }
                Ok(builder.body(Body::from(body)).unwrap())
            }
            Reply::Fail => {
                let err = reqwest::Client::new()
                    .get("unreachable")
                    .build()
                    .unwrap_err();
                Err(UpstreamError::Transport(err))
            }
        }
    }
}

/// Router of a relay wired to `upstream`.
pub fn app(config: ProxyConfig, upstream: Arc<MockUpstream>) -> axum::Router {
    HttpServer::with_upstream(config, upstream).router()
}

/// Send one request through `app`.
pub async fn send(app: axum::Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "relay.test")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a backend on an ephemeral port.
///
/// `f` receives the raw request (head and body) and returns the full raw HTTP response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let response = f(request).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Read the request head plus a `Content-Length` delimited body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let mut total = None;
    loop {
        match total {
            Some(total) if buf.len() >= total => break,
            Some(_) => {}
            None => {
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    total = Some(end + 4 + length);
                    continue;
                }
            }
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Raw HTTP/1.1 response with a body and extra header lines.
pub fn raw_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}
