//! Repository layer for database operations
//!
//! [`Store`] is the persistence collaborator the circulation services talk to.
//! Plain reads and catalog/user writes are auto-committed; borrow and return
//! run inside a [`StoreTx`] unit obtained from [`Store::begin`], which is
//! atomic: either everything done through it is committed or nothing is.

pub mod books;
pub mod categories;
pub mod loans;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, NewBook},
        category::Category,
        loan::{Loan, LoanDetails, LoanFilter, NewLoan},
        user::{NewUser, User},
    },
};

pub use memory::MemoryStore;

/// Shared handle to the persistence backend
pub type SharedStore = Arc<dyn Store>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Start an atomic borrow/return unit of work
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    async fn get_user(&self, id: i32) -> AppResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;
    /// Returns false when the user does not exist
    async fn set_user_blocked(&self, id: i32, blocked: bool) -> AppResult<bool>;
    /// Returns false when the user does not exist
    async fn set_user_active(&self, id: i32, active: bool) -> AppResult<bool>;
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn get_book(&self, id: i32) -> AppResult<Option<Book>>;
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn insert_book(&self, book: &NewBook) -> AppResult<Book>;
    async fn delete_book(&self, id: i32) -> AppResult<bool>;
    async fn book_has_loans(&self, id: i32) -> AppResult<bool>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn find_category(&self, category: &str, sub_category: &str)
        -> AppResult<Option<Category>>;
    async fn insert_category(&self, category: &str, sub_category: &str) -> AppResult<Category>;

    async fn list_loans(&self, filter: LoanFilter) -> AppResult<Vec<LoanDetails>>;
}

/// Atomic unit of work over book availability flags and the loan log.
/// Dropping it without calling [`StoreTx::commit`] rolls everything back.
#[async_trait]
pub trait StoreTx: Send {
    /// Read a book's availability flag, locking it for the rest of the unit.
    /// `None` when the book does not exist.
    async fn book_ordered(&mut self, book_id: i32) -> AppResult<Option<bool>>;

    /// Set the flag. With `expected = Some(v)` the write only happens if the
    /// current value is `v`; returns whether a row was written.
    async fn set_book_ordered(
        &mut self,
        book_id: i32,
        ordered: bool,
        expected: Option<bool>,
    ) -> AppResult<bool>;

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan>;

    /// Mark the oldest open loan of `(user_id, book_id)` as returned
    async fn close_open_loan(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Loan>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// PostgreSQL-backed store holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub books: books::BooksRepository,
    pub categories: categories::CategoriesRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl Store for Repository {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        Ok(Box::new(self.loans.begin().await?))
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        self.users.get_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.get_by_email(email).await
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.users.email_exists(email).await
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        self.users.create(user).await
    }

    async fn set_user_blocked(&self, id: i32, blocked: bool) -> AppResult<bool> {
        self.users.set_blocked(id, blocked).await
    }

    async fn set_user_active(&self, id: i32, active: bool) -> AppResult<bool> {
        self.users.set_active(id, active).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn get_book(&self, id: i32) -> AppResult<Option<Book>> {
        self.books.get_by_id(id).await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        self.books.create(book).await
    }

    async fn delete_book(&self, id: i32) -> AppResult<bool> {
        self.books.delete(id).await
    }

    async fn book_has_loans(&self, id: i32) -> AppResult<bool> {
        self.books.has_loans(id).await
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.categories.list().await
    }

    async fn find_category(
        &self,
        category: &str,
        sub_category: &str,
    ) -> AppResult<Option<Category>> {
        self.categories.find(category, sub_category).await
    }

    async fn insert_category(&self, category: &str, sub_category: &str) -> AppResult<Category> {
        self.categories.create(category, sub_category).await
    }

    async fn list_loans(&self, filter: LoanFilter) -> AppResult<Vec<LoanDetails>> {
        self.loans.list(filter).await
    }
}
