use std::future::Future;
use std::path::{Component, Path};
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use tracing::{debug, warn};

use crate::AppState;
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::handlers::http::reply::{HttpResponse, Reply, finish};
use crate::handlers::http::utils::{
    deliver_message_json, deliver_redirect, deliver_static_file, get_cookie,
};
use crate::handlers::http::{auth, items, pages};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two tiers:
//
//   OpenHandler       no auth.  Receives (req, state).
//                       Use for: /login, /register, /logout, /health.
//
//   ProtectedHandler  auth gate runs first (session → token → user id).
//                       Receives (req, state, ctx).
//                       Use for: the dashboard and everything under /items.
//
// Request bodies are collected before dispatch, so handlers see
// `Request<Bytes>` and can be driven without a socket.

pub type HandlerResult = Result<Reply, AppError>;

type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type OpenHandler = Box<dyn Fn(Request<Bytes>, AppState) -> HandlerFuture + Send + Sync>;

type ProtectedHandler =
    Box<dyn Fn(Request<Bytes>, AppState, AuthContext) -> HandlerFuture + Send + Sync>;

/// How a protected route turns away an unauthenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `403 {"message": ...}` for API callers.
    Forbidden,
    /// `302 /login` for browsers.
    RedirectToLogin,
}

enum RouteKind {
    Open(OpenHandler),
    Protected(Rejection, ProtectedHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

/// Named `:param` segments captured by the matching route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The `:name` segment of the matched route, if any.
pub fn path_param<'a>(req: &'a Request<Bytes>, name: &str) -> Option<&'a str> {
    req.extensions().get::<PathParams>()?.get(name)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn protected<F, Fut>(mut self, method: Method, path: &str, reject: Rejection, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Protected(
                reject,
                Box::new(move |req, state, ctx| Box::pin(handler(req, state, ctx))),
            ),
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Protected (auth gate first) ───────────────────────────────────────────

    pub fn get_protected<F, Fut>(self, path: &str, reject: Rejection, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.protected(Method::GET, path, reject, handler)
    }

    pub fn post_protected<F, Fut>(self, path: &str, reject: Rejection, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.protected(Method::POST, path, reject, handler)
    }

    pub fn put_protected<F, Fut>(self, path: &str, reject: Rejection, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.protected(Method::PUT, path, reject, handler)
    }

    pub fn delete_protected<F, Fut>(self, path: &str, reject: Rejection, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.protected(Method::DELETE, path, reject, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route<B>(&self, req: Request<B>, state: AppState) -> Result<HttpResponse>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("Failed to read request body: {}", e);
                return deliver_message_json("can not read the request body", StatusCode::BAD_REQUEST)
                    .context("Failed to deliver 400 response");
            }
        };
        let mut req = Request::from_parts(parts, body);

        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method {
                continue;
            }
            let Some(params) = Self::match_path(&route.path, &path) else {
                continue;
            };
            req.extensions_mut().insert(params);

            return match &route.kind {
                RouteKind::Open(h) => finish(h(req, state).await),

                RouteKind::Protected(reject, h) => {
                    let session_id = get_cookie(req.headers(), state.cookie_name());
                    let admitted = state.gate().authorize(session_id.as_deref()).await;
                    match admitted {
                        Ok(ctx) => finish(h(req, state, ctx).await),
                        Err(rejection) => match AppError::from(rejection) {
                            AppError::Auth(rejection) => {
                                warn!("Rejected {} {}: {}", method, path, rejection);
                                match reject {
                                    Rejection::Forbidden => {
                                        finish(Err(AppError::Auth(rejection)))
                                    }
                                    Rejection::RedirectToLogin => deliver_redirect("/login"),
                                }
                            }
                            // Store failures answer 500 on every channel.
                            fault => finish(Err(fault)),
                        },
                    }
                }
            };
        }

        // No registered route matched; try static file fallback for GET.
        if method == Method::GET {
            if let Some(static_response) = Self::try_serve_static(&path, &state).await {
                return Ok(static_response);
            }
        }

        debug!("No route for {} {}", method, path);
        deliver_message_json("Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    /// Segment-by-segment match. A `:param` segment matches any non-empty
    /// segment, so "/items/:id" never matches "/items/".
    fn match_path(route_path: &str, request_path: &str) -> Option<PathParams> {
        let clean = request_path.split('?').next().unwrap_or(request_path);

        if route_path == clean {
            return Some(PathParams::default());
        }

        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return None;
        }

        let mut params = Vec::new();
        for (r, p) in route_segs.iter().zip(path_segs.iter()) {
            match r.strip_prefix(':') {
                Some(name) if !p.is_empty() => params.push((name.to_string(), p.to_string())),
                Some(_) => return None,
                None if r == p => {}
                None => return None,
            }
        }
        Some(PathParams(params))
    }

    // ── Static file fallback ──────────────────────────────────────────────────

    async fn try_serve_static(path: &str, state: &AppState) -> Option<HttpResponse> {
        let relative = path.strip_prefix("/static/")?;
        let relative = Path::new(relative);

        // Only plain names below the static dir; no `..`, no absolute paths.
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            warn!("Refusing static path {}", path);
            return None;
        }

        let file_path = state.config.paths.web_dir.join("static").join(relative);
        match deliver_static_file(&file_path).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!("Static file unavailable: {:#}", e);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application router
//
// Auth tier is enforced here at the routing level; handlers MUST NOT repeat
// the gate call. JSON routes reject with 403, page routes with a redirect.
// ---------------------------------------------------------------------------

pub fn build_router() -> Router {
    Router::new()
        // ── Public ───────────────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            Reply::json(&serde_json::json!({ "status": "ok" }))
        })
        .get("/login", |req, _state| async move { pages::login_page(&req) })
        .post("/login", |req, state| async move {
            auth::handle_login(req, state).await
        })
        .get("/register", |req, _state| async move {
            pages::register_page(&req)
        })
        .post("/register", |req, state| async move {
            auth::handle_register(req, state).await
        })
        .get("/logout", |req, state| async move {
            auth::handle_logout(req, state).await
        })
        // ── Pages behind the gate ─────────────────────────────────────────────
        .get_protected("/", Rejection::RedirectToLogin, |_req, state, ctx| async move {
            pages::dashboard(state, ctx).await
        })
        // ── Items API ────────────────────────────────────────────────────────
        //
        // "/items/" is registered before "/items/:id" so the list route wins.
        .get_protected("/items/", Rejection::Forbidden, |req, state, ctx| async move {
            items::list(req, state, ctx).await
        })
        .post_protected("/items/", Rejection::Forbidden, |req, state, ctx| async move {
            items::create(req, state, ctx).await
        })
        .get_protected("/items/:id", Rejection::Forbidden, |req, state, ctx| async move {
            items::get(req, state, ctx).await
        })
        .put_protected("/items/:id", Rejection::Forbidden, |req, state, ctx| async move {
            items::update(req, state, ctx).await
        })
        .delete_protected("/items/:id", Rejection::Forbidden, |req, state, ctx| async move {
            items::delete(req, state, ctx).await
        })
}
