use sqlx::SqlitePool;
use tracing::info;

use crate::database::utils::is_unique_violation;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Outcome of an insert that may lose a race on the UNIQUE columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(i64),
    Conflict,
}

/// Insert a user and return the generated id.
pub async fn register_user(pool: &SqlitePool, new_user: NewUser) -> Result<CreateOutcome, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)")
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .execute(pool)
        .await;

    match result {
        Ok(done) => {
            info!("New user made! {}", new_user.username);
            Ok(CreateOutcome::Created(done.last_insert_rowid()))
        }
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
        Err(err) => Err(err),
    }
}

/// Check whether the username or the email is already taken.
pub async fn user_exists(pool: &SqlitePool, username: &str, email: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2")
            .bind(username)
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::memory_pool as pool;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn ids_are_generated() {
        let pool = pool().await;
        let first = register_user(&pool, alice()).await.unwrap();
        let second = register_user(
            &pool,
            NewUser {
                username: "bob".into(),
                email: "bob@x.com".into(),
                password_hash: "h".into(),
            },
        )
        .await
        .unwrap();
        match (first, second) {
            (CreateOutcome::Created(a), CreateOutcome::Created(b)) => assert_ne!(a, b),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = pool().await;
        register_user(&pool, alice()).await.unwrap();
        let mut again = alice();
        again.email = "other@x.com".into();
        assert_eq!(
            register_user(&pool, again).await.unwrap(),
            CreateOutcome::Conflict
        );
    }

    #[tokio::test]
    async fn exists_matches_on_either_column() {
        let pool = pool().await;
        register_user(&pool, alice()).await.unwrap();
        assert!(user_exists(&pool, "alice", "new@x.com").await.unwrap());
        assert!(user_exists(&pool, "newbie", "alice@x.com").await.unwrap());
        assert!(!user_exists(&pool, "newbie", "new@x.com").await.unwrap());
    }
}
