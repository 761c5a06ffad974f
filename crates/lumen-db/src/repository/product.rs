//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - Full-text search using FTS5, with category filter and paging
//! - CRUD operations for the back office
//! - Soft delete (`is_active = 0`) so order history keeps its references
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "snowy lake"                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Tokenized + quoted: "snowy"* "lake"*   (every token, prefix match)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────┐                       │
//! │  │ products_fts (virtual table)                │                       │
//! │  │                                             │                       │
//! │  │ Snowy peaks  | Lake at dawn, Patagonia      │ ← MATCH!              │
//! │  │ Lakeside     | Snowy morning on the shore   │ ← MATCH!              │
//! │  │ Desert road  | Heat haze over the asphalt   │                       │
//! │  └─────────────────────────────────────────────┘                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Joined back to products, active only, ordered by rank                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lumen_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.title, p.description, p.price_cents, \
     p.currency, p.preview_url, p.asset_url, p.width_px, p.height_px, p.is_active, \
     p.created_at, p.updated_at";

/// Default page size of the public catalog.
pub const DEFAULT_PAGE_SIZE: i64 = 24;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Filters for the public catalog listing.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Free-text search over title and description.
    pub text: Option<String>,
    /// Category slug.
    pub category_slug: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl ProductQuery {
    /// Builds a query, clamping paging to sane bounds.
    pub fn new(
        text: Option<String>,
        category_slug: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Self {
        ProductQuery {
            text: text.filter(|t| !t.trim().is_empty()),
            category_slug: category_slug.filter(|s| !s.trim().is_empty()),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// Turns user input into an FTS5 MATCH expression.
///
/// Each alphanumeric token is quoted (so FTS5 operators in the input are
/// inert) and gets a prefix wildcard. Returns `None` when nothing
/// searchable is left.
pub fn fts_query(input: &str) -> Option<String> {
    let tokens: Vec<String> = input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"*", t.to_lowercase()))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products.
    ///
    /// ## How It Works
    /// - With text: FTS5 MATCH over title/description, ordered by rank
    /// - Without text: newest first
    /// - Text with no searchable token (e.g. `"!!!"`): empty page
    /// - `category_slug` narrows either mode
    ///
    /// ## Example
    /// ```rust,ignore
    /// let query = ProductQuery::new(Some("lake".into()), Some("landscapes".into()), None, None);
    /// let products = repo.search(&query).await?;
    /// ```
    pub async fn search(&self, query: &ProductQuery) -> DbResult<Vec<Product>> {
        let fts = match query.text.as_deref() {
            Some(text) => match fts_query(text) {
                Some(fts) => Some(fts),
                None => {
                    debug!(text = %text, "Search text has no searchable tokens");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        debug!(
            text = ?query.text,
            category = ?query.category_slug,
            limit = query.limit,
            offset = query.offset,
            "Searching products"
        );

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p "));

        if fts.is_some() {
            qb.push("INNER JOIN products_fts ON p.rowid = products_fts.rowid ");
        }
        if query.category_slug.is_some() {
            qb.push("INNER JOIN categories c ON c.id = p.category_id ");
        }

        qb.push("WHERE p.is_active = 1 ");

        if let Some(fts) = &fts {
            qb.push("AND products_fts MATCH ").push_bind(fts.clone()).push(" ");
        }
        if let Some(slug) = &query.category_slug {
            qb.push("AND c.slug = ").push_bind(slug.clone()).push(" ");
        }

        if fts.is_some() {
            qb.push("ORDER BY products_fts.rank ");
        } else {
            qb.push("ORDER BY p.created_at DESC, p.title ");
        }

        qb.push("LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Loads several products at once. Missing ids are simply absent from
    /// the result.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Every product including inactive ones, for the back office.
    pub async fn list_all(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             ORDER BY p.created_at DESC, p.title LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Number of active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - `category_id` doesn't exist
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, title, description, price_cents, currency,
                preview_url, asset_url, width_px, height_px, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(&product.preview_url)
        .bind(&product.asset_url)
        .bind(product.width_px)
        .bind(product.height_px)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product and returns the stored row.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?,
                title = ?,
                description = ?,
                price_cents = ?,
                currency = ?,
                preview_url = ?,
                asset_url = ?,
                width_px = ?,
                height_px = ?,
                is_active = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.category_id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(&product.preview_url)
        .bind(&product.asset_url)
        .bind(product.width_px)
        .bind(product.height_px)
        .bind(product.is_active)
        .bind(now)
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    /// Hides a product from the catalog without touching order history.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{category, product, test_db};

    #[test]
    fn test_fts_query_building() {
        assert_eq!(fts_query("lake"), Some("\"lake\"*".to_string()));
        assert_eq!(fts_query("Snowy  Lake"), Some("\"snowy\"* \"lake\"*".to_string()));
        assert_eq!(fts_query("lake\" OR title:*"), Some("\"lake\"* \"or\"* \"title\"*".to_string()));
        assert_eq!(fts_query("  ---  "), None);
    }

    #[test]
    fn test_query_paging_is_clamped() {
        let q = ProductQuery::new(None, None, None, None);
        assert_eq!(q.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset, 0);

        let q = ProductQuery::new(Some("  ".into()), Some("".into()), Some(1000), Some(-5));
        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.offset, 0);
        assert!(q.text.is_none());
        assert!(q.category_slug.is_none());
    }

    #[tokio::test]
    async fn test_search_by_text_prefix() {
        let db = test_db().await;
        let repo = db.products();

        let mut lake = product("Lake at dawn", 1500, None);
        lake.description = Some("Patagonia, early morning".to_string());
        repo.insert(&lake).await.unwrap();
        repo.insert(&product("Desert road", 1200, None)).await.unwrap();

        let found = repo
            .search(&ProductQuery::new(Some("patag".into()), None, None, None))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, lake.id);

        let all = repo.search(&ProductQuery::new(None, None, None, None)).await.unwrap();
        assert_eq!(all.len(), 2);

        let punctuation = repo
            .search(&ProductQuery::new(Some("!!!".into()), None, None, None))
            .await
            .unwrap();
        assert!(punctuation.is_empty());
    }

    #[tokio::test]
    async fn test_search_sees_updated_title() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = product("Untitled", 1500, None);
        repo.insert(&p).await.unwrap();

        p.title = "Glacier".to_string();
        repo.update(&p).await.unwrap();

        let q = |t: &str| ProductQuery::new(Some(t.to_string()), None, None, None);
        assert_eq!(repo.search(&q("glacier")).await.unwrap().len(), 1);
        assert!(repo.search(&q("untitled")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_category_and_paging() {
        let db = test_db().await;
        let landscapes = category("Landscapes", "landscapes");
        db.categories().insert(&landscapes).await.unwrap();

        let repo = db.products();
        for i in 0..3 {
            repo.insert(&product(&format!("Hill {i}"), 1000, Some(&landscapes.id)))
                .await
                .unwrap();
        }
        repo.insert(&product("Hill portrait", 1000, None)).await.unwrap();

        let in_cat = repo
            .search(&ProductQuery::new(Some("hill".into()), Some("landscapes".into()), None, None))
            .await
            .unwrap();
        assert_eq!(in_cat.len(), 3);

        let page = repo
            .search(&ProductQuery::new(None, Some("landscapes".into()), Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);

        let none = repo
            .search(&ProductQuery::new(None, Some("missing".into()), None, None))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_catalog() {
        let db = test_db().await;
        let repo = db.products();

        let p = product("Old pier", 900, None);
        repo.insert(&p).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        assert!(repo.search(&ProductQuery::new(None, None, None, None)).await.unwrap().is_empty());
        assert_eq!(repo.count_active().await.unwrap(), 0);

        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(repo.list_all(10, 0).await.unwrap().len(), 1);

        assert!(repo.soft_delete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let db = test_db().await;
        let repo = db.products();

        let a = product("A", 100, None);
        let b = product("B", 200, None);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let found = repo
            .get_many(&[a.id.clone(), "missing".to_string(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_with_unknown_category() {
        let db = test_db().await;
        let err = db
            .products()
            .insert(&product("Orphan", 100, Some("no-such-category")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
