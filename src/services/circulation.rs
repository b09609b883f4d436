//! Loan workflow: borrow and return transitions.
//!
//! Per book: `Available --borrow--> Ordered --give_back--> Available`.
//! Per loan: `open --give_back--> returned` (terminal).
//!
//! Each transition runs as one [`StoreTx`](crate::repository::StoreTx) unit,
//! so the availability flag and the loan log never disagree and two
//! concurrent borrows of the same book cannot both succeed.

use chrono::{DateTime, Utc};

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::loan::{BorrowOutcome, LoanDetails, LoanFilter, NewLoan, ReturnOutcome},
    repository::SharedStore,
};

use super::{credentials::CredentialStore, inventory::InventoryLedger};

#[derive(Clone)]
pub struct LoanWorkflow {
    store: SharedStore,
    inventory: InventoryLedger,
    credentials: CredentialStore,
    config: CirculationConfig,
}

impl LoanWorkflow {
    pub fn new(
        store: SharedStore,
        inventory: InventoryLedger,
        credentials: CredentialStore,
        config: CirculationConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            credentials,
            config,
        }
    }

    /// Borrow a book for a user
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<BorrowOutcome> {
        self.borrow_at(user_id, book_id, Utc::now()).await
    }

    pub async fn borrow_at(
        &self,
        user_id: i32,
        book_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<BorrowOutcome> {
        // Resolved before the unit starts: the unit holds the book lock
        let borrower = self.credentials.get(user_id).await?;
        if self.config.reject_blocked_borrowers && borrower.blocked {
            return Err(AppError::Authorization(format!(
                "User {} is blocked and cannot borrow",
                user_id
            )));
        }

        let mut tx = self.store.begin().await?;

        if !self.inventory.is_available_in(tx.as_mut(), book_id).await? {
            tracing::debug!("Book {} already ordered, borrow by user {} refused", book_id, user_id);
            return Ok(BorrowOutcome::AlreadyOrdered);
        }

        match self.inventory.mark_ordered(tx.as_mut(), book_id).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                tracing::warn!("Lost borrow race on book {} (user {})", book_id, user_id);
                return Ok(BorrowOutcome::AlreadyOrdered);
            }
            Err(e) => return Err(e),
        }

        let loan = match tx
            .insert_loan(&NewLoan {
                user_id,
                book_id,
                ordered_on: now,
            })
            .await
        {
            Ok(loan) => loan,
            Err(AppError::Conflict(_)) => {
                tracing::warn!("Open loan already recorded for book {}", book_id);
                return Ok(BorrowOutcome::AlreadyOrdered);
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;

        tracing::info!("User {} borrowed book {} (loan {})", user_id, book_id, loan.id);
        Ok(BorrowOutcome::Borrowed(loan))
    }

    /// Return a book previously borrowed by a user.
    ///
    /// With `strict_returns` off, the availability flag is cleared even when no
    /// open loan matches `(user_id, book_id)`.
    pub async fn give_back(&self, user_id: i32, book_id: i32) -> AppResult<ReturnOutcome> {
        let mut tx = self.store.begin().await?;

        self.inventory.mark_available(tx.as_mut(), book_id).await?;

        match tx.close_open_loan(user_id, book_id).await? {
            Some(loan) => {
                tx.commit().await?;
                tracing::info!("User {} returned book {} (loan {})", user_id, book_id, loan.id);
                Ok(ReturnOutcome::Returned(loan))
            }
            None => {
                if !self.config.strict_returns {
                    tx.commit().await?;
                }
                tracing::warn!("No open loan for user {} and book {}", user_id, book_id);
                Ok(ReturnOutcome::NoMatchingLoan)
            }
        }
    }

    /// Loan history of one user
    pub async fn loans_of(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.credentials.get(user_id).await?;
        self.store.list_loans(LoanFilter::for_user(user_id)).await
    }

    /// Every loan in the library
    pub async fn all_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.store.list_loans(LoanFilter::all()).await
    }
}
