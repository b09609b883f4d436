//! Catalog service: books and categories

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CatalogEntry, CreateBook, NewBook},
        category::{group_categories, Category, CategoryNode, CreateCategory},
    },
    repository::SharedStore,
};

#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
}

impl CatalogService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// List all books with their availability
    pub async fn list_catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        let books = self.store.list_books().await?;
        tracing::debug!("Catalog listing: {} books", books.len());
        Ok(books.into_iter().map(CatalogEntry::from).collect())
    }

    /// Insert a book into an existing category
    pub async fn insert_book(&self, book: CreateBook) -> AppResult<Book> {
        let book = book.normalized();
        book.validate()?;

        let category = self
            .store
            .find_category(&book.category, &book.sub_category)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Category {}/{} not found",
                    book.category, book.sub_category
                ))
            })?;

        let created = self
            .store
            .insert_book(&NewBook {
                title: book.title,
                author: book.author,
                price: book.price,
                category_id: category.id,
            })
            .await?;

        tracing::info!("Inserted book {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Delete a book; refused while any loan references it
    pub async fn delete_book(&self, id: i32) -> AppResult<bool> {
        if self.store.book_has_loans(id).await? {
            return Err(AppError::Conflict(format!(
                "Book {} has loan history and cannot be deleted",
                id
            )));
        }
        let deleted = self.store.delete_book(id).await?;
        if deleted {
            tracing::info!("Deleted book {}", id);
        }
        Ok(deleted)
    }

    /// Categories grouped as a tree
    pub async fn list_categories(&self) -> AppResult<Vec<CategoryNode>> {
        let categories = self.store.list_categories().await?;
        Ok(group_categories(&categories))
    }

    pub async fn insert_category(&self, category: CreateCategory) -> AppResult<Category> {
        let category = category.normalized();
        category.validate()?;
        let created = self
            .store
            .insert_category(&category.category, &category.sub_category)
            .await?;
        tracing::info!(
            "Inserted category {}/{}",
            created.category,
            created.sub_category
        );
        Ok(created)
    }
}
