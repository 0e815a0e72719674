use sqlx::{Row, SqlitePool};

/// Everything the login flow needs about a user.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Get user authentication data by username
pub async fn get_user_auth(pool: &SqlitePool, username: &str) -> Result<Option<UserAuth>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT user_id, username, email, password FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| UserAuth {
        user_id: row.get("user_id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::memory_pool;
    use crate::database::register::{CreateOutcome, NewUser, register_user};

    #[tokio::test]
    async fn lookup_by_username() {
        let pool = memory_pool().await;

        let outcome = register_user(
            &pool,
            NewUser {
                username: "alice".into(),
                email: "alice@x.com".into(),
                password_hash: "digest".into(),
            },
        )
        .await
        .unwrap();
        let CreateOutcome::Created(id) = outcome else {
            panic!("user not created");
        };

        let user = get_user_auth(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.password_hash, "digest");

        assert!(get_user_auth(&pool, "nobody").await.unwrap().is_none());
    }
}
