//! In-process store with the same transactional contract as PostgreSQL.
//!
//! A unit of work holds the state lock for its whole lifetime and edits a
//! staged copy; `commit` swaps the copy in. Dropping the unit discards it.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, NewBook},
        category::Category,
        loan::{Loan, LoanDetails, LoanFilter, NewLoan},
        user::{NewUser, User},
    },
};

use super::{Store, StoreTx};

#[derive(Debug, Clone)]
struct BookRecord {
    id: i32,
    title: String,
    author: String,
    price: Decimal,
    ordered: bool,
    category_id: i32,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    categories: Vec<Category>,
    books: Vec<BookRecord>,
    loans: Vec<Loan>,
    next_user_id: i32,
    next_category_id: i32,
    next_book_id: i32,
    next_loan_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryState {
    fn book(&self, id: i32) -> Option<Book> {
        let record = self.books.iter().find(|b| b.id == id)?;
        let category = self.categories.iter().find(|c| c.id == record.category_id)?;
        Some(Book {
            id: record.id,
            title: record.title.clone(),
            author: record.author.clone(),
            price: record.price,
            ordered: record.ordered,
            category_id: record.category_id,
            category: category.category.clone(),
            sub_category: category.sub_category.clone(),
        })
    }

    fn loan_details(&self, loan: &Loan) -> Option<LoanDetails> {
        let user = self.users.iter().find(|u| u.id == loan.user_id)?;
        let book = self.books.iter().find(|b| b.id == loan.book_id)?;
        Some(LoanDetails {
            id: loan.id,
            user_id: loan.user_id,
            name: user.full_name(),
            book_id: loan.book_id,
            book_name: book.title.clone(),
            order_date: loan.ordered_on,
            returned: loan.returned,
        })
    }
}

/// Store kept entirely in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("Email is not available.".to_string()));
        }
        let created = User {
            id: next_id(&mut state.next_user_id),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            mobile: user.mobile.clone(),
            password: user.password_hash.clone(),
            blocked: user.blocked,
            active: user.active,
            role: user.role,
            created_on: user.created_on,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn set_user_blocked(&self, id: i32, blocked: bool) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.blocked = blocked;
                true
            }
            None => false,
        })
    }

    async fn set_user_active(&self, id: i32, active: bool) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        })
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state.users.clone())
    }

    async fn get_book(&self, id: i32) -> AppResult<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.book(id))
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.iter().filter_map(|b| state.book(b.id)).collect())
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        if !state.categories.iter().any(|c| c.id == book.category_id) {
            return Err(AppError::NotFound(format!(
                "Category with id {} not found",
                book.category_id
            )));
        }
        let id = next_id(&mut state.next_book_id);
        state.books.push(BookRecord {
            id,
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
            ordered: false,
            category_id: book.category_id,
        });
        state
            .book(id)
            .ok_or_else(|| AppError::Internal(format!("Book {} vanished after insert", id)))
    }

    async fn delete_book(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.loans.iter().any(|l| l.book_id == id) {
            return Err(AppError::Conflict(format!("Book {} is referenced by loans", id)));
        }
        let before = state.books.len();
        state.books.retain(|b| b.id != id);
        Ok(state.books.len() < before)
    }

    async fn book_has_loans(&self, id: i32) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.loans.iter().any(|l| l.book_id == id))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let state = self.state.lock().await;
        Ok(state.categories.clone())
    }

    async fn find_category(
        &self,
        category: &str,
        sub_category: &str,
    ) -> AppResult<Option<Category>> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .iter()
            .find(|c| c.category == category && c.sub_category == sub_category)
            .cloned())
    }

    async fn insert_category(&self, category: &str, sub_category: &str) -> AppResult<Category> {
        let mut state = self.state.lock().await;
        if state
            .categories
            .iter()
            .any(|c| c.category == category && c.sub_category == sub_category)
        {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
        let created = Category {
            id: next_id(&mut state.next_category_id),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
        };
        state.categories.push(created.clone());
        Ok(created)
    }

    async fn list_loans(&self, filter: LoanFilter) -> AppResult<Vec<LoanDetails>> {
        let state = self.state.lock().await;
        let mut loans: Vec<LoanDetails> = state
            .loans
            .iter()
            .filter(|l| filter.matches(l.user_id, l.returned))
            .filter_map(|l| state.loan_details(l))
            .collect();
        loans.sort_by(|a, b| a.order_date.cmp(&b.order_date).then(a.id.cmp(&b.id)));
        Ok(loans)
    }
}

/// Unit of work over a staged copy of the state
struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn book_ordered(&mut self, book_id: i32) -> AppResult<Option<bool>> {
        Ok(self
            .staged
            .books
            .iter()
            .find(|b| b.id == book_id)
            .map(|b| b.ordered))
    }

    async fn set_book_ordered(
        &mut self,
        book_id: i32,
        ordered: bool,
        expected: Option<bool>,
    ) -> AppResult<bool> {
        match self.staged.books.iter_mut().find(|b| b.id == book_id) {
            Some(book) if expected.map_or(true, |e| book.ordered == e) => {
                book.ordered = ordered;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        if !self.staged.users.iter().any(|u| u.id == loan.user_id) {
            return Err(AppError::NotFound(format!("User with id {} not found", loan.user_id)));
        }
        if !self.staged.books.iter().any(|b| b.id == loan.book_id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", loan.book_id)));
        }
        if self
            .staged
            .loans
            .iter()
            .any(|l| l.book_id == loan.book_id && !l.returned)
        {
            return Err(AppError::Conflict(format!(
                "Book {} already has an open loan",
                loan.book_id
            )));
        }
        let created = Loan {
            id: next_id(&mut self.staged.next_loan_id),
            user_id: loan.user_id,
            book_id: loan.book_id,
            ordered_on: loan.ordered_on,
            returned: false,
        };
        self.staged.loans.push(created.clone());
        Ok(created)
    }

    async fn close_open_loan(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Loan>> {
        let open = self
            .staged
            .loans
            .iter_mut()
            .filter(|l| l.user_id == user_id && l.book_id == book_id && !l.returned)
            .min_by_key(|l| l.ordered_on);
        Ok(open.map(|loan| {
            loan.returned = true;
            loan.clone()
        }))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
