pub use in_memory_books_repository::InMemoryBookRepository;
pub use sqlite_books_repository::SqliteBookRepository;

use crate::api::{BookDetails, BookId, BookRecord, BookRecordPatch};
use crate::query::{FilterSpec, SortSpec};

mod in_memory_books_repository;
mod sqlite_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database failure {0}")]
    DatabaseFailure(#[from] rusqlite::Error),

    #[error("Other error {0}")]
    Other(String),
}

pub trait BookRepository: Send + Sync {
    /// Adds a book to the catalog, returns the id assigned to the book.
    /// New records always start out available with no due date.
    fn add_book(&self, details: BookDetails) -> Result<BookId, BookRepositoryError>;
    /// Retrieves a single record from the catalog
    fn get_book(&self, book_id: BookId) -> Result<BookRecord, BookRepositoryError>;
    /// Applies the supplied fields of the patch and leaves the rest unchanged.
    /// This is the unguarded escape hatch: it will happily set status and
    /// due date independently of each other.
    fn update_book(
        &self,
        book_id: BookId,
        patch: BookRecordPatch,
    ) -> Result<(), BookRepositoryError>;
    /// Removes the record permanently. Its id is never handed out again.
    fn delete_book(&self, book_id: BookId) -> Result<(), BookRepositoryError>;
    /// Lists records matching the filter, ordered by the sort field.
    /// Without a sort, records come back in insertion order.
    fn list_books(
        &self,
        filter: Option<&FilterSpec>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<BookRecord>, BookRepositoryError>;
}

pub(crate) fn validate_details(details: &BookDetails) -> Result<(), BookRepositoryError> {
    for (name, value) in [
        ("title", &details.title),
        ("author", &details.author),
        ("genre", &details.genre),
    ] {
        if value.trim().is_empty() {
            return Err(BookRepositoryError::Validation(format!(
                "{name} must not be empty"
            )));
        }
    }
    Ok(())
}

pub(crate) fn validate_patch(patch: &BookRecordPatch) -> Result<(), BookRepositoryError> {
    for (name, value) in [
        ("title", &patch.title),
        ("author", &patch.author),
        ("genre", &patch.genre),
    ] {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(BookRepositoryError::Validation(format!(
                    "{name} must not be empty"
                )));
            }
        }
    }
    Ok(())
}
