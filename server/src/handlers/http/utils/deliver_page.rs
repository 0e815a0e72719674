use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::HeaderValue;
use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::{Response, StatusCode, header};
use tracing::{debug, error, info};

use crate::handlers::http::utils::headers;

/// Read a static asset from disk and deliver it, cacheable for an hour.
/// Rendered pages go through [`deliver_html`], which is never cached.
pub async fn deliver_static_file<P: AsRef<Path>>(
    file_path: P,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let path = file_path.as_ref();

    debug!("Reading static file from: {}", path.display());

    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read static file: {}", path.display()))?;

    let mime_type = get_mime_type(path);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .body(full(content))
        .map_err(|e| anyhow!("Failed to build response: {}", e))?;

    Ok(headers::add_cache_headers_with_max_age(response, None))
}

/// Deliver an in-memory HTML document
pub fn deliver_html(
    html: impl Into<Bytes>,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(full(html))
        .map_err(|e| anyhow!("Failed to build HTML response: {}", e))?;

    Ok(headers::add_no_cache_headers(response))
}

/// Helper function to determine MIME type from file extension
pub fn get_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|s| s.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Delivers a redirect response
pub fn deliver_redirect(location: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_redirect_with_cookie(location, None)
}

/// Delivers a redirect response, optionally setting a cookie on the way
pub fn deliver_redirect_with_cookie(
    location: &str,
    cookie: Option<HeaderValue>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Delivering redirect to: {}", location);

    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);

    if let Some(c) = cookie {
        builder = builder.header(header::SET_COOKIE, c);
    }
    let response = builder.body(empty()).map_err(|e: http::Error| {
        error!("Failed to build redirect response to {}: {}", location, e);
        anyhow!("Failed to build redirect response: {}", e)
    })?;

    Ok(response)
}

/// Helper function to create an empty body
pub fn empty() -> BoxBody<Bytes, Infallible> {
    Empty::<Bytes>::new().boxed()
}

/// Helper function to create a full body from various types
pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    Full::new(chunk.into()).boxed()
}
