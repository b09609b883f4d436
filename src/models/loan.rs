//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;


/// Loan row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub ordered_on: DateTime<Utc>,
    pub returned: bool,
}

/// Loan to append to the loan log
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i32,
    pub book_id: i32,
    pub ordered_on: DateTime<Utc>,
}

/// Loan joined with borrower and book for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub book_id: i32,
    pub book_name: String,
    pub order_date: DateTime<Utc>,
    pub returned: bool,
}

/// Loan listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub user_id: Option<i32>,
    pub open_only: bool,
}

impl LoanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            open_only: false,
        }
    }

    pub fn open() -> Self {
        Self {
            user_id: None,
            open_only: true,
        }
    }

    pub fn open_for_user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            open_only: true,
        }
    }

    pub fn matches(&self, user_id: i32, returned: bool) -> bool {
        self.user_id.map_or(true, |id| id == user_id) && !(self.open_only && returned)
    }
}

/// Result of a borrow attempt. Losing a race is a normal outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum BorrowOutcome {
    Borrowed(Loan),
    AlreadyOrdered,
}

impl BorrowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BorrowOutcome::Borrowed(_))
    }
}

/// Result of a return attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned(Loan),
    NoMatchingLoan,
}

impl ReturnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReturnOutcome::Returned(_))
    }
}
