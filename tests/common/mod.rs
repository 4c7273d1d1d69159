#![allow(dead_code)]

use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::{json, Value};

use scribe::{app::build_app, state::AppState};

pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over the in-memory store, on an ephemeral port.
    pub async fn spawn() -> Self {
        let app = build_app(AppState::fake());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            client: Client::new(),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Registers and returns `(session cookie token, user json)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, Value) {
        let res = self
            .post("/auth/register")
            .json(&json!({ "name": name, "email": email, "password": "hunter22" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
        let token = session_token(&res).expect("register sets the session cookie");
        let body: Value = res.json().await.unwrap();
        (token, body["user"].clone())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Value of the `authToken` cookie set by the response, if any.
pub fn session_token(res: &Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.split(';').next()?.strip_prefix("authToken=").map(str::to_string))
}

pub trait WithSession {
    fn session(self, token: &str) -> Self;
}

impl WithSession for RequestBuilder {
    fn session(self, token: &str) -> Self {
        self.header(header::COOKIE, format!("authToken={token}"))
    }
}
