//! # Category Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lumen_core::Category;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - slug already taken
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(slug = %category.slug, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &category.slug))?;

        Ok(())
    }

    /// Updates name, slug and description.
    pub async fn update(&self, category: &Category) -> DbResult<Category> {
        debug!(id = %category.id, "Updating category");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE categories SET name = ?, slug = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(now)
        .bind(&category.id)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &category.slug))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(Category {
            updated_at: now,
            ..category.clone()
        })
    }

    /// Deletes a category. Its products keep existing, uncategorized.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, slug),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{category, product, test_db};

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert(&category("Portraits", "portraits")).await.unwrap();
        repo.insert(&category("animals", "animals")).await.unwrap();
        repo.insert(&category("Landscapes", "landscapes")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["animals", "Landscapes", "Portraits"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert(&category("Landscapes", "landscapes")).await.unwrap();
        let err = repo
            .insert(&category("Landscapes 2", "landscapes"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_update_and_get_by_slug() {
        let db = test_db().await;
        let repo = db.categories();

        let mut cat = category("Night", "night");
        repo.insert(&cat).await.unwrap();

        cat.name = "Night Sky".to_string();
        cat.slug = "night-sky".to_string();
        repo.update(&cat).await.unwrap();

        assert!(repo.get_by_slug("night").await.unwrap().is_none());
        let found = repo.get_by_slug("night-sky").await.unwrap().unwrap();
        assert_eq!(found.id, cat.id);
        assert_eq!(found.name, "Night Sky");
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_products() {
        let db = test_db().await;
        let cat = category("Street", "street");
        db.categories().insert(&cat).await.unwrap();

        let p = product("Crosswalk", 1500, Some(&cat.id));
        db.products().insert(&p).await.unwrap();

        db.categories().delete(&cat.id).await.unwrap();
        assert!(db.categories().get_by_id(&cat.id).await.unwrap().is_none());

        let p = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(p.category_id, None);

        assert!(db.categories().delete(&cat.id).await.unwrap_err().is_not_found());
    }
}
