//! Data models for Bibliotheca

pub mod book;
pub mod category;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{Book, CatalogEntry, CreateBook, NewBook};
pub use category::{Category, CategoryNode, CreateCategory};
pub use loan::{BorrowOutcome, Loan, LoanDetails, LoanFilter, NewLoan, ReturnOutcome};
pub use user::{CreateAccount, NewUser, User, UserClaims, UserRole, UserWithFine};
