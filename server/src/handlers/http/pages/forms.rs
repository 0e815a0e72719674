//! Login and registration forms. The `?error=<code>` query is resolved to
//! its message here, on the server.

use bytes::Bytes;
use hyper::Request;

use shared::types::login::AuthErrorCode;

use crate::handlers::http::pages::escape_html;
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;

/// Error code carried in the query string, if it is one we know.
pub fn error_from_query(query: Option<&str>) -> Option<AuthErrorCode> {
    form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .find(|(key, _)| key == "error")
        .and_then(|(_, value)| AuthErrorCode::from_query_value(&value))
}

fn banner(error: Option<AuthErrorCode>) -> String {
    error
        .map(|code| {
            format!(
                r#"<p class="form-error">{}</p>"#,
                escape_html(code.message())
            )
        })
        .unwrap_or_default()
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/css/style.css">
</head>
<body class="standard">
  <main class="auth-card">
{body}
  </main>
</body>
</html>
"#
    )
}

pub fn render_login(error: Option<AuthErrorCode>) -> String {
    page(
        "Sign in",
        &format!(
            r#"    <h1>Sign in</h1>
    {}
    <form method="post" action="/login">
      <label>Username <input type="text" name="username" required></label>
      <label>Password <input type="password" name="password" required></label>
      <button type="submit">Sign in</button>
    </form>
    <p><a href="/register">Create an account</a></p>"#,
            banner(error)
        ),
    )
}

pub fn render_register(error: Option<AuthErrorCode>) -> String {
    page(
        "Register",
        &format!(
            r#"    <h1>Register</h1>
    {}
    <form method="post" action="/register">
      <label>Username <input type="text" name="username" required></label>
      <label>Email <input type="email" name="email" required></label>
      <label>Password <input type="password" name="password" minlength="6" required></label>
      <button type="submit">Register</button>
    </form>
    <p><a href="/login">Already registered? Sign in</a></p>"#,
            banner(error)
        ),
    )
}

/// GET /login
pub fn login_page(req: &Request<Bytes>) -> HandlerResult {
    Ok(Reply::html(render_login(error_from_query(req.uri().query()))))
}

/// GET /register
pub fn register_page(req: &Request<Bytes>) -> HandlerResult {
    Ok(Reply::html(render_register(error_from_query(
        req.uri().query(),
    ))))
}
