#![allow(dead_code)]

use axum::body::Body;
use http::{Method, Request};
use memberdir::client::MemberClient;
use memberdir::db;
use memberdir::routes;
use memberdir::state::AppState;
use serde_json::json;
use sqlx::SqlitePool;

/// Test server that owns an in-memory SQLite pool.
/// Each instance is isolated, so tests can run in parallel.
pub struct TestServer {
    pub state: AppState,
}

impl TestServer {
    /// Create a new TestServer with an in-memory SQLite database.
    pub async fn new() -> Self {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("failed to create test pool");

        Self {
            state: AppState { db: pool },
        }
    }

    /// Returns an Axum Router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.state.db
    }

    /// Binds a TCP listener on port 0, spawns the server, and returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{}", addr.port())
    }

    /// Spawns the server and returns a client pointed at its API root.
    pub async fn client(&self) -> MemberClient {
        let base = self.spawn().await;
        MemberClient::new(format!("{base}/api"))
    }

    pub async fn member_count(&self) -> i64 {
        db::members::count_members(self.pool()).await.unwrap()
    }
}

/// A payload the form-side rules also accept.
pub fn member_payload(name: &str, email: &str) -> serde_json::Value {
    json!({
        "name": name,
        "email": email,
        "phone": "0123456789",
        "birthday": "2004-05-23",
        "country": "Vietnam",
        "city": "Hanoi",
        "district": "Cau Giay",
        "address": "123 Street A"
    })
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a request with a JSON body.
pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Parse a response body into a `serde_json::Value`.
pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn test_app() -> axum::Router {
    let server = TestServer::new().await;
    routes::router(server.state)
}
