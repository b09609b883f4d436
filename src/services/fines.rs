//! Fine engine: outstanding fines derived from open, overdue loans.
//!
//! Nothing is persisted. A user's fine is a pure function of the open loans
//! and `now`, recomputed on every query.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        loan::{LoanDetails, LoanFilter},
        user::UserWithFine,
    },
    repository::SharedStore,
};

use super::credentials::CredentialStore;

/// Loan period and daily rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinePolicy {
    pub loan_period_days: i64,
    pub fine_per_day: i64,
}

impl From<&CirculationConfig> for FinePolicy {
    fn from(config: &CirculationConfig) -> Self {
        Self {
            loan_period_days: config.loan_period_days,
            fine_per_day: config.fine_per_day,
        }
    }
}

impl FinePolicy {
    /// Whole days past the due date, never negative
    pub fn overdue_days(&self, ordered_on: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let due = ordered_on + Duration::days(self.loan_period_days);
        (now - due).num_days().max(0)
    }

    /// Sum of fines over `loans`; returned loans contribute nothing
    pub fn fine_for(&self, loans: &[LoanDetails], now: DateTime<Utc>) -> i64 {
        loans
            .iter()
            .filter(|loan| !loan.returned)
            .map(|loan| self.overdue_days(loan.order_date, now) * self.fine_per_day)
            .sum()
    }
}

#[derive(Clone)]
pub struct FineEngine {
    store: SharedStore,
    credentials: CredentialStore,
    policy: FinePolicy,
}

impl FineEngine {
    pub fn new(store: SharedStore, credentials: CredentialStore, policy: FinePolicy) -> Self {
        Self {
            store,
            credentials,
            policy,
        }
    }

    pub async fn compute_fine(&self, user_id: i32) -> AppResult<i64> {
        self.compute_fine_at(user_id, Utc::now()).await
    }

    pub async fn compute_fine_at(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<i64> {
        self.credentials.get(user_id).await?;
        let open = self.store.list_loans(LoanFilter::open_for_user(user_id)).await?;
        Ok(self.policy.fine_for(&open, now))
    }

    /// Every user with their current fine
    pub async fn users_with_fines(&self) -> AppResult<Vec<UserWithFine>> {
        self.users_with_fines_at(Utc::now()).await
    }

    pub async fn users_with_fines_at(&self, now: DateTime<Utc>) -> AppResult<Vec<UserWithFine>> {
        let users = self.credentials.list().await?;
        let open = self.store.list_loans(LoanFilter::open()).await?;

        let mut by_user: HashMap<i32, Vec<LoanDetails>> = HashMap::new();
        for loan in open {
            by_user.entry(loan.user_id).or_default().push(loan);
        }

        tracing::debug!("Computed fines for {} users", users.len());

        Ok(users
            .into_iter()
            .map(|user| {
                let fine = by_user
                    .get(&user.id)
                    .map_or(0, |loans| self.policy.fine_for(loans, now));
                UserWithFine { user, fine }
            })
            .collect())
    }
}
