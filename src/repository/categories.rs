//! Book categories repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::category::Category,
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, category, sub_category FROM book_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Find a category by its (category, subcategory) pair
    pub async fn find(&self, category: &str, sub_category: &str) -> AppResult<Option<Category>> {
        let found = sqlx::query_as::<_, Category>(
            "SELECT id, category, sub_category FROM book_categories WHERE category = $1 AND sub_category = $2",
        )
        .bind(category)
        .bind(sub_category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn create(&self, category: &str, sub_category: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO book_categories (category, sub_category)
            VALUES ($1, $2)
            RETURNING id, category, sub_category
            "#,
        )
        .bind(category)
        .bind(sub_category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Category already exists".to_string())
            }
            other => AppError::Database(other),
        })
    }
}
