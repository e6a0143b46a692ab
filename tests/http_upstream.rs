//! Network-level tests: the reqwest transport and the served relay against
//! programmable TCP backends.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
};
use gh_relay::config::RelayConfig;
use gh_relay::proxy::{HttpUpstream, ProxyEngine, RedirectPolicy, Upstream, UpstreamRequest};
use gh_relay::{HttpServer, ProxyConfig, Shutdown};
use tokio::net::TcpListener;
use url::Url;

mod common;
use common::{body_string, raw_response, start_programmable_backend};

fn transport() -> HttpUpstream {
    HttpUpstream::new(Duration::from_secs(5), 10).unwrap()
}

async fn redirecting_backend() -> std::net::SocketAddr {
    start_programmable_backend(|head| async move {
        if head.starts_with("GET /start") {
            raw_response("302 Found", &[("Location", "/final")], "")
        } else {
            raw_response("200 OK", &[("Content-Type", "text/plain")], "final")
        }
    })
    .await
}

#[tokio::test]
async fn manual_policy_returns_redirect() {
    let backend = redirecting_backend().await;
    let url = Url::parse(&format!("http://{backend}/start")).unwrap();

    let response = transport()
        .fetch(UpstreamRequest::get(url, RedirectPolicy::Manual))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/final");
    assert!(response.headers().get("connection").is_none());
}

#[tokio::test]
async fn follow_policy_chases_redirects() {
    let backend = redirecting_backend().await;
    let url = Url::parse(&format!("http://{backend}/start")).unwrap();

    let response = transport()
        .fetch(UpstreamRequest::get(url, RedirectPolicy::Follow))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "final");
}

#[tokio::test]
async fn request_headers_reach_backend() {
    let backend = start_programmable_backend(|head| async move {
        raw_response("200 OK", &[], &head.to_ascii_lowercase())
    })
    .await;
    let url = Url::parse(&format!("http://{backend}/echo")).unwrap();
    let mut request = UpstreamRequest::get(url, RedirectPolicy::Manual);
    request
        .headers
        .insert("x-relay-test", HeaderValue::from_static("yes"));

    let response = transport().fetch(request).await.unwrap();

    let echoed = body_string(response).await;
    assert!(echoed.starts_with("get /echo http/1.1"), "{echoed}");
    assert!(echoed.contains("x-relay-test: yes"), "{echoed}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/")).unwrap();

    let result = transport()
        .fetch(UpstreamRequest::get(url, RedirectPolicy::Manual))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn followed_hop_drops_stale_body_framing() {
    let target = start_programmable_backend(|request| async move {
        raw_response("200 OK", &[], &request.to_ascii_lowercase())
    })
    .await;
    let origin = start_programmable_backend(move |_| async move {
        let location = format!("http://{target}/final");
        raw_response("307 Temporary Redirect", &[("Location", location.as_str())], "")
    })
    .await;

    let engine = ProxyEngine::new(Arc::new(transport()), &RelayConfig::default());
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("7"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        engine.handle(
            &format!("http://{origin}/start"),
            Method::POST,
            &headers,
            Body::from("payload"),
        ),
    )
    .await
    .expect("relay stalled on the followed hop")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = body_string(response).await;
    assert!(echoed.starts_with("post /final http/1.1"), "{echoed}");
    assert!(echoed.contains("content-type: text/plain"), "{echoed}");
    assert!(!echoed.contains("content-length: 7"), "{echoed}");
    assert!(!echoed.contains("payload"), "{echoed}");
}

/// Serve a relay on an ephemeral port; the returned handle stops it.
async fn serve(config: ProxyConfig) -> (std::net::SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn served_relay_falls_back_to_asset_origin() {
    let backend = start_programmable_backend(|head| async move {
        let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
        raw_response("200 OK", &[("Content-Type", "text/plain")], &path)
    })
    .await;
    let mut config = ProxyConfig::default();
    config.relay.asset_url = format!("http://{backend}/gh-proxy/");
    let (addr, shutdown) = serve(config).await;

    let response = client()
        .get(format!("http://{addr}/sw.js"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().get("access-control-allow-origin").is_none());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "/gh-proxy/sw.js");

    shutdown.trigger();
}

#[tokio::test]
async fn served_relay_answers_shorthand() {
    let (addr, shutdown) = serve(ProxyConfig::default()).await;

    let response = client()
        .get(format!("http://{addr}/?q=github.com/foo/bar/tags"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()["location"],
        format!("https://{addr}/github.com/foo/bar/tags").as_str()
    );

    shutdown.trigger();
}
