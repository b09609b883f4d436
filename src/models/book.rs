//! Book model and catalog views

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Book row joined with its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    /// Availability flag: true while an open loan exists
    pub ordered: bool,
    pub category_id: i32,
    pub category: String,
    pub sub_category: String,
}

/// Catalog entry as shown to readers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub sub_category: String,
    pub price: Decimal,
    pub available: bool,
    pub author: String,
}

impl From<Book> for CatalogEntry {
    fn from(book: Book) -> Self {
        CatalogEntry {
            id: book.id,
            title: book.title,
            category: book.category,
            sub_category: book.sub_category,
            price: book.price,
            available: !book.ordered,
            author: book.author,
        }
    }
}

/// Insert book request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    pub price: Decimal,
    pub category: String,
    pub sub_category: String,
}

impl CreateBook {
    /// Trim text fields and lower-case the category pair
    pub fn normalized(self) -> Self {
        CreateBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            price: self.price,
            category: self.category.trim().to_lowercase(),
            sub_category: self.sub_category.trim().to_lowercase(),
        }
    }
}

/// Row to insert once the category has been resolved
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub category_id: i32,
}
