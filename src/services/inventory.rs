//! Inventory ledger: per-book binary availability.
//!
//! The ledger only reflects `books.ordered`; it has no idea who holds a loan.
//! Writes go through a [`StoreTx`] so they commit together with the loan log.

use crate::{
    error::{AppError, AppResult},
    repository::{SharedStore, StoreTx},
};

#[derive(Clone)]
pub struct InventoryLedger {
    store: SharedStore,
}

fn book_not_found(book_id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", book_id))
}

impl InventoryLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Committed availability of a book
    pub async fn is_available(&self, book_id: i32) -> AppResult<bool> {
        let book = self
            .store
            .get_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;
        Ok(!book.ordered)
    }

    /// Availability as seen inside a unit of work; locks the book row
    pub async fn is_available_in(&self, tx: &mut dyn StoreTx, book_id: i32) -> AppResult<bool> {
        let ordered = tx
            .book_ordered(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;
        Ok(!ordered)
    }

    /// Flip a book to ordered. Fails with `Conflict` if it already is.
    pub async fn mark_ordered(&self, tx: &mut dyn StoreTx, book_id: i32) -> AppResult<()> {
        if tx.set_book_ordered(book_id, true, Some(false)).await? {
            return Ok(());
        }
        match tx.book_ordered(book_id).await? {
            Some(_) => Err(AppError::Conflict(format!("Book {} is already ordered", book_id))),
            None => Err(book_not_found(book_id)),
        }
    }

    /// Flip a book back to available, whatever its current state
    pub async fn mark_available(&self, tx: &mut dyn StoreTx, book_id: i32) -> AppResult<()> {
        if tx.set_book_ordered(book_id, false, None).await? {
            Ok(())
        } else {
            Err(book_not_found(book_id))
        }
    }
}
