//! # Favorite Repository
//!
//! Per-user bookmarks. Adding is idempotent; listing joins back to the
//! catalog and skips products that were soft-deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::product::PRODUCT_COLUMNS;
use crate::error::DbResult;
use lumen_core::Product;

#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FavoriteRepository { pool }
    }

    /// Bookmarks a product. Adding an existing favorite is a no-op.
    pub async fn add(&self, user_id: &str, product_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, product_id = %product_id, "Adding favorite");

        sqlx::query(
            "INSERT OR IGNORE INTO favorites (user_id, product_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a bookmark. Returns whether one existed.
    pub async fn remove(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's favorite products, most recently added first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM favorites f
            INNER JOIN products p ON p.id = f.product_id
            WHERE f.user_id = ? AND p.is_active = 1
            ORDER BY f.created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::test_support::{product, test_db, user};
    use lumen_core::Role;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let db = test_db().await;
        let ana = user("ana@example.com", Role::Customer);
        db.users().insert(&ana).await.unwrap();
        let p = product("Lake", 1500, None);
        db.products().insert(&p).await.unwrap();

        let repo = db.favorites();
        repo.add(&ana.id, &p.id).await.unwrap();
        repo.add(&ana.id, &p.id).await.unwrap();

        let favorites = repo.list_for_user(&ana.id).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, p.id);

        assert!(repo.remove(&ana.id, &p.id).await.unwrap());
        assert!(!repo.remove(&ana.id, &p.id).await.unwrap());
        assert!(repo.list_for_user(&ana.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_products_are_hidden() {
        let db = test_db().await;
        let ana = user("ana@example.com", Role::Customer);
        db.users().insert(&ana).await.unwrap();
        let p = product("Lake", 1500, None);
        db.products().insert(&p).await.unwrap();

        db.favorites().add(&ana.id, &p.id).await.unwrap();
        db.products().soft_delete(&p.id).await.unwrap();

        assert!(db.favorites().list_for_user(&ana.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let db = test_db().await;
        let ana = user("ana@example.com", Role::Customer);
        db.users().insert(&ana).await.unwrap();

        let err = db.favorites().add(&ana.id, "missing").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
