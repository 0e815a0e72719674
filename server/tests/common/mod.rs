#![allow(dead_code)]

use std::path::PathBuf;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderMap};
use hyper::{Method, Request, StatusCode};

use shared::types::server_config::{AppConfig, SessionBackend};
use todo_server::AppState;
use todo_server::handlers::{Router, build_router};

pub const SECRET: &str = "integration-secret-integration-se";

/// Config for an in-memory instance with a cheap hasher.
pub fn test_config(backend: SessionBackend) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.jwt_secret = Some(SECRET.to_string());
    config.auth.hash_memory_kib = 1024;
    config.auth.hash_iterations = 1;
    config.session.backend = backend;
    config.paths.web_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../web");
    config
}

pub async fn test_state() -> AppState {
    AppState::build(test_config(SessionBackend::Sqlite))
        .await
        .expect("test state")
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drives the router directly, keeping the session cookie like a browser.
pub struct Browser {
    router: Router,
    state: AppState,
    pub cookie: Option<String>,
}

impl Browser {
    pub fn new(state: &AppState) -> Self {
        Self {
            router: build_router(),
            state: state.clone(),
            cookie: None,
        }
    }

    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: impl Into<Bytes>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(
                header::COOKIE,
                format!("{}={}", self.state.cookie_name(), cookie),
            );
        }
        let req = builder.body(Full::new(body.into())).unwrap();

        let res = self.router.route(req, self.state.clone()).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();

        if let Some(set_cookie) = headers.get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            let (_, value) = pair.split_once('=').unwrap();
            self.cookie = (!value.is_empty()).then(|| value.to_string());
        }

        let body = res.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Bytes::new()).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, Bytes::new()).await
    }

    pub async fn form(&mut self, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.send(
            Method::POST,
            uri,
            Some("application/x-www-form-urlencoded"),
            body,
        )
        .await
    }

    pub async fn json(
        &mut self,
        method: Method,
        uri: &str,
        value: serde_json::Value,
    ) -> TestResponse {
        self.send(
            method,
            uri,
            Some("application/json"),
            value.to_string(),
        )
        .await
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> TestResponse {
        self.form(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.form("/login", &[("username", username), ("password", password)])
            .await
    }

    /// Register and log in; panics if either step does not redirect as expected.
    pub async fn sign_up(&mut self, username: &str) {
        let email = format!("{username}@x.com");
        let res = self.register(username, &email, "secret1").await;
        assert_eq!(res.location(), Some("/login"), "register {username}");
        let res = self.login(username, "secret1").await;
        assert_eq!(res.location(), Some("/"), "login {username}");
    }
}
