//! Ownership-scoped item storage.
//!
//! Every query carries the owner id taken from the authenticated session.
//! An item that exists but belongs to someone else is indistinguishable
//! from one that does not exist.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use shared::types::item::{Item, ItemInput};

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found")]
    NotFound,

    #[error("invalid item: {0}")]
    Validation(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Explicit LIMIT/OFFSET window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Window for a 1-based `page` of `size` rows. Missing or non-positive
    /// values fall back to the defaults.
    pub fn from_page(page: Option<i64>, size: Option<i64>) -> Self {
        let size = size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        Self {
            limit: size,
            offset: (page - 1).saturating_mul(size),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_page(None, None)
    }
}

fn validate(input: &ItemInput) -> Result<(), StoreError> {
    if input.title.is_empty() {
        return Err(StoreError::Validation("title is required"));
    }
    if input.status < 1 {
        return Err(StoreError::Validation("status is required"));
    }
    Ok(())
}

fn row_to_item(row: &SqliteRow) -> Item {
    Item {
        item_id: row.get("item_id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        status: row.get("status"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

/// Insert a new item owned by `owner_id` and return it with its id.
pub async fn insert(pool: &SqlitePool, input: &ItemInput, owner_id: i64) -> Result<Item, StoreError> {
    validate(input)?;

    let now = Utc::now();
    let done = sqlx::query(
        "INSERT INTO items (user_id, title, description, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(owner_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let item_id = done.last_insert_rowid();
    info!("Item {} created for user {}", item_id, owner_id);
    find(pool, item_id, owner_id).await
}

/// Fetch one item, only if `owner_id` owns it.
pub async fn find(pool: &SqlitePool, item_id: i64, owner_id: i64) -> Result<Item, StoreError> {
    let row = sqlx::query(
        "SELECT item_id, user_id, title, description, status, created_at, updated_at
         FROM items WHERE item_id = ?1 AND user_id = ?2",
    )
    .bind(item_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_item).ok_or(StoreError::NotFound)
}

/// One page of the owner's items, by status then id.
pub async fn find_all(
    pool: &SqlitePool,
    page: Pagination,
    owner_id: i64,
) -> Result<Vec<Item>, StoreError> {
    let rows = sqlx::query(
        "SELECT item_id, user_id, title, description, status, created_at, updated_at
         FROM items WHERE user_id = ?1
         ORDER BY status ASC, item_id ASC
         LIMIT ?2 OFFSET ?3",
    )
    .bind(owner_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    debug!("Listed {} items for user {}", rows.len(), owner_id);
    Ok(rows.iter().map(row_to_item).collect())
}

/// Overwrite title, description and status of an owned item.
pub async fn update(
    pool: &SqlitePool,
    item_id: i64,
    input: &ItemInput,
    owner_id: i64,
) -> Result<(), StoreError> {
    validate(input)?;
    find(pool, item_id, owner_id).await?;

    sqlx::query(
        "UPDATE items SET title = ?1, description = ?2, status = ?3, updated_at = ?4
         WHERE item_id = ?5 AND user_id = ?6",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.status)
    .bind(Utc::now())
    .bind(item_id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    info!("Item {} updated by user {}", item_id, owner_id);
    Ok(())
}

/// Physically remove an owned item.
pub async fn delete(pool: &SqlitePool, item_id: i64, owner_id: i64) -> Result<(), StoreError> {
    find(pool, item_id, owner_id).await?;

    sqlx::query("DELETE FROM items WHERE item_id = ?1 AND user_id = ?2")
        .bind(item_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    info!("Item {} deleted by user {}", item_id, owner_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::memory_pool;
    use crate::database::register::{CreateOutcome, NewUser, register_user};
    use proptest::prelude::*;
    use shared::types::item::{STATUS_COMPLETED, STATUS_PROCESSING};

    async fn user(pool: &SqlitePool, name: &str) -> i64 {
        let outcome = register_user(
            pool,
            NewUser {
                username: name.into(),
                email: format!("{name}@x.com"),
                password_hash: "h".into(),
            },
        )
        .await
        .unwrap();
        match outcome {
            CreateOutcome::Created(id) => id,
            CreateOutcome::Conflict => panic!("duplicate test user"),
        }
    }

    fn input(title: &str, status: i64) -> ItemInput {
        ItemInput {
            title: title.into(),
            description: String::new(),
            status,
        }
    }

    #[tokio::test]
    async fn insert_stamps_owner() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        let item = insert(&pool, &input("buy milk", STATUS_PROCESSING), alice)
            .await
            .unwrap();
        assert_eq!(item.user_id, alice);
        assert_eq!(item.title, "buy milk");
        assert!(item.item_id > 0);
    }

    #[tokio::test]
    async fn other_owner_sees_not_found() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let item = insert(&pool, &input("secret", STATUS_PROCESSING), alice)
            .await
            .unwrap();

        assert!(matches!(
            find(&pool, item.item_id, bob).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            update(&pool, item.item_id, &input("pwned", 1), bob).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            delete(&pool, item.item_id, bob).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(find(&pool, item.item_id, alice).await.unwrap().title, "secret");
    }

    #[tokio::test]
    async fn find_all_orders_by_status_then_id() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let done = insert(&pool, &input("a", STATUS_COMPLETED), alice).await.unwrap();
        let open1 = insert(&pool, &input("b", STATUS_PROCESSING), alice).await.unwrap();
        insert(&pool, &input("bob's", STATUS_PROCESSING), bob).await.unwrap();
        let open2 = insert(&pool, &input("c", STATUS_PROCESSING), alice).await.unwrap();

        let ids: Vec<i64> = find_all(&pool, Pagination::default(), alice)
            .await
            .unwrap()
            .iter()
            .map(|i| i.item_id)
            .collect();
        assert_eq!(ids, vec![open1.item_id, open2.item_id, done.item_id]);

        let second_page = find_all(&pool, Pagination::from_page(Some(2), Some(2)), alice)
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].item_id, done.item_id);
    }

    #[tokio::test]
    async fn update_changes_fields_and_timestamp() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        let item = insert(&pool, &input("draft", STATUS_PROCESSING), alice)
            .await
            .unwrap();

        let change = ItemInput {
            title: "final".into(),
            description: "done now".into(),
            status: STATUS_COMPLETED,
        };
        update(&pool, item.item_id, &change, alice).await.unwrap();

        let after = find(&pool, item.item_id, alice).await.unwrap();
        assert_eq!(after.title, "final");
        assert_eq!(after.description, "done now");
        assert_eq!(after.status, STATUS_COMPLETED);
        assert_eq!(after.created_at, item.created_at);
        assert!(after.updated_at >= item.updated_at);
    }

    #[tokio::test]
    async fn delete_is_physical() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        let item = insert(&pool, &input("gone", STATUS_PROCESSING), alice)
            .await
            .unwrap();
        delete(&pool, item.item_id, alice).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(matches!(
            delete(&pool, item.item_id, alice).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage() {
        let pool = memory_pool().await;
        let alice = user(&pool, "alice").await;
        assert!(matches!(
            insert(&pool, &input("", STATUS_PROCESSING), alice).await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            insert(&pool, &input("x", 0), alice).await,
            Err(StoreError::Validation(_))
        ));

        let item = insert(&pool, &input("x", 1), alice).await.unwrap();
        assert!(matches!(
            update(&pool, item.item_id, &input("", 1), alice).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn pagination_defaults() {
        assert_eq!(
            Pagination::from_page(None, None),
            Pagination {
                limit: 100,
                offset: 0
            }
        );
        assert_eq!(
            Pagination::from_page(Some(0), Some(-5)),
            Pagination {
                limit: 100,
                offset: 0
            }
        );
        assert_eq!(
            Pagination::from_page(Some(3), Some(10)),
            Pagination {
                limit: 10,
                offset: 20
            }
        );
    }

    proptest! {
        #[test]
        fn offset_is_previous_pages(page in 1i64..10_000, size in 1i64..10_000) {
            let window = Pagination::from_page(Some(page), Some(size));
            prop_assert_eq!(window.limit, size);
            prop_assert_eq!(window.offset, (page - 1) * size);
        }

        #[test]
        fn non_positive_inputs_fall_back(page in i64::MIN..=0, size in i64::MIN..=0) {
            prop_assert_eq!(Pagination::from_page(Some(page), Some(size)), Pagination::default());
        }
    }
}
