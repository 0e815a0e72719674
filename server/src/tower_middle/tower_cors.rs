use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, StatusCode};
use tower::{Layer, Service};
use tracing::debug;

use crate::handlers::http::HttpResponse;
use crate::handlers::http::utils::empty;

/// Tower layer that answers CORS for a fixed list of origins.
///
/// Requests from other origins pass through untouched and the browser
/// enforces the rest.
#[derive(Debug, Clone)]
pub struct CorsLayer {
    allowed_origins: Arc<Vec<String>>,
}

impl CorsLayer {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = CorsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsService {
            inner,
            allowed_origins: Arc::clone(&self.allowed_origins),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsService<S> {
    inner: S,
    allowed_origins: Arc<Vec<String>>,
}

/// Add CORS headers to a response
pub fn add_cors_headers(mut res: HttpResponse, origin: HeaderValue) -> HttpResponse {
    let headers = res.headers_mut();

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));

    res
}

impl<S, ReqBody> Service<Request<ReqBody>> for CorsService<S>
where
    S: Service<Request<ReqBody>, Response = HttpResponse> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = HttpResponse;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .filter(|value| {
                value
                    .to_str()
                    .map(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
                    .unwrap_or(false)
            })
            .cloned();

        // Preflight from a known origin never reaches the router.
        if let (Some(origin), true) = (origin.clone(), req.method() == Method::OPTIONS) {
            debug!("Answering CORS preflight");
            let mut res = HttpResponse::new(empty());
            *res.status_mut() = StatusCode::NO_CONTENT;
            let res = add_cors_headers(res, origin);
            return Box::pin(async move { Ok(res) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let res = inner.call(req).await?;
            Ok(match origin {
                Some(origin) => add_cors_headers(res, origin),
                None => res,
            })
        })
    }
}
