//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook},
};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.author, b.price, b.ordered, b.category_id,
           c.category, c.sub_category
    FROM books b
    JOIN book_categories c ON b.category_id = c.id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// List the whole catalog
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} ORDER BY b.id", BOOK_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Insert a book; new books are always available
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author, price, ordered, category_id)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(book.category_id)
        .fetch_one(&self.pool)
        .await?;

        let created = sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// Delete a book by ID; refused while loan rows reference it
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::Conflict(format!("Book {} has loan history and cannot be deleted", id))
                }
                other => AppError::Database(other),
            })?;
        Ok(result.rows_affected() == 1)
    }

    /// Whether any loan row (open or closed) references the book
    pub async fn has_loans(&self, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
