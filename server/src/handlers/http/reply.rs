//! What handlers hand back to the router.
//!
//! Handlers never build hyper responses themselves; they return a `Reply`
//! or an `AppError` and the router converts either one on the way out.

use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http::HeaderValue;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::error::AppError;
use crate::handlers::http::utils::{
    deliver_html, deliver_message_json, deliver_redirect_with_cookie, deliver_serialized_json,
};

pub type HttpResponse = Response<BoxBody<Bytes, Infallible>>;

#[derive(Debug)]
pub enum Reply {
    /// A resource (or list of them), already serialized, with 200.
    Json(serde_json::Value),
    /// `{"message": ...}`.
    Message(StatusCode, String),
    /// 302, optionally setting a cookie.
    Redirect {
        location: String,
        cookie: Option<HeaderValue>,
    },
    /// A rendered page.
    Html(StatusCode, String),
}

impl Reply {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, AppError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| AppError::Internal(e.into()))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(StatusCode::OK, message.into())
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            cookie: None,
        }
    }

    pub fn redirect_with_cookie(location: impl Into<String>, cookie: HeaderValue) -> Self {
        Self::Redirect {
            location: location.into(),
            cookie: Some(cookie),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::Html(StatusCode::OK, body.into())
    }

    pub fn into_response(self) -> Result<HttpResponse> {
        match self {
            Self::Json(value) => deliver_serialized_json(&value, StatusCode::OK),
            Self::Message(status, message) => deliver_message_json(&message, status),
            Self::Redirect { location, cookie } => deliver_redirect_with_cookie(&location, cookie),
            Self::Html(status, body) => deliver_html(body, status),
        }
    }
}

impl AppError {
    pub fn into_response(self) -> Result<HttpResponse> {
        self.log();
        deliver_message_json(self.message(), self.status())
    }
}

/// Collapse a handler outcome into a response.
pub fn finish(outcome: Result<Reply, AppError>) -> Result<HttpResponse> {
    match outcome {
        Ok(reply) => reply.into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BIND_INPUT_ERROR;
    use http_body_util::BodyExt;

    async fn body_json(res: HttpResponse) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn message_reply_is_a_message_object() {
        let res = Reply::message("Updated").into_response().unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, serde_json::json!({"message": "Updated"}));
    }

    #[tokio::test]
    async fn errors_become_status_and_message() {
        let res = finish(Err(AppError::Validation(BIND_INPUT_ERROR))).unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await,
            serde_json::json!({"message": BIND_INPUT_ERROR})
        );
    }

    #[test]
    fn redirect_reply_is_found() {
        let res = Reply::redirect("/login?error=4").into_response().unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[hyper::header::LOCATION], "/login?error=4");
    }

    #[test]
    fn html_reply_is_html() {
        let res = Reply::html("<p>hi</p>").into_response().unwrap();
        assert_eq!(
            res.headers()[hyper::header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
