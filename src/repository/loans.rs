//! Loans repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, LoanFilter, NewLoan},
};

use super::StoreTx;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List loans joined with borrower name and book title
    pub async fn list(&self, filter: LoanFilter) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.user_id, CONCAT(u.first_name, ' ', u.last_name) AS name,
                   l.book_id, b.title AS book_name,
                   l.ordered_on AS order_date, l.returned
            FROM loans l
            JOIN users u ON l.user_id = u.id
            JOIN books b ON l.book_id = b.id
            WHERE ($1::INTEGER IS NULL OR l.user_id = $1)
              AND (NOT $2 OR NOT l.returned)
            ORDER BY l.ordered_on, l.id
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.open_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Open a transaction for a borrow or return critical section
    pub async fn begin(&self) -> AppResult<PgCirculationTx> {
        Ok(PgCirculationTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// Borrow/return unit of work against PostgreSQL.
///
/// The book row is locked with `FOR UPDATE` before it is read, so two
/// concurrent units on the same book serialize on that lock. The partial
/// unique index `loans_open_book_key` backs the one-open-loan rule.
pub struct PgCirculationTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgCirculationTx {
    async fn book_ordered(&mut self, book_id: i32) -> AppResult<Option<bool>> {
        let ordered: Option<bool> =
            sqlx::query_scalar("SELECT ordered FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(ordered)
    }

    async fn set_book_ordered(
        &mut self,
        book_id: i32,
        ordered: bool,
        expected: Option<bool>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET ordered = $1 WHERE id = $2 AND ($3::BOOLEAN IS NULL OR ordered = $3)",
        )
        .bind(ordered)
        .bind(book_id)
        .bind(expected)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, ordered_on, returned)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, user_id, book_id, ordered_on, returned
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.ordered_on)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Book {} already has an open loan", loan.book_id))
            }
            other => AppError::Database(other),
        })
    }

    async fn close_open_loan(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned = TRUE
            WHERE id = (
                SELECT id FROM loans
                WHERE user_id = $1 AND book_id = $2 AND NOT returned
                ORDER BY ordered_on
                LIMIT 1
                FOR UPDATE
            )
            RETURNING id, user_id, book_id, ordered_on, returned
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(loan)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
