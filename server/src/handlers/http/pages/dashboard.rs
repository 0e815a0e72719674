use anyhow::Context;
use tracing::debug;

use crate::AppState;
use crate::auth::AuthContext;
use crate::handlers::http::pages::escape_html;
use crate::handlers::http::reply::Reply;
use crate::handlers::http::routes::HandlerResult;

const USERNAME_SLOT: &str = "{{username}}";

/// Fill the shell template with the signed-in user's name.
pub fn render_dashboard(template: &str, username: &str) -> String {
    template.replace(USERNAME_SLOT, &escape_html(username))
}

/// GET /: the dashboard shell; the item list itself is fetched by script.
pub async fn dashboard(state: AppState, ctx: AuthContext) -> HandlerResult {
    let path = state.config.paths.web_dir.join("index.html");
    let template = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    debug!("Rendering dashboard for user {}", ctx.user_id);
    Ok(Reply::html(render_dashboard(&template, &ctx.username)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_escaped_into_every_slot() {
        let html = render_dashboard(
            r#"<span data-username="{{username}}">{{username}}</span>"#,
            "<al&ce>",
        );
        assert_eq!(
            html,
            r#"<span data-username="&lt;al&amp;ce&gt;">&lt;al&amp;ce&gt;</span>"#
        );
    }
}
