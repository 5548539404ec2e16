use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::api::{BookDetails, BookId, BookRecord, BookRecordPatch, BookStatus};
use crate::books_repository::{
    validate_details, validate_patch, BookRepository, BookRepositoryError,
};
use crate::query::{FilterSpec, SortSpec};

/// Volatile catalog used by tests and by the CLI's in-memory mode.
/// Records live in a BTreeMap keyed by their monotonically assigned id, so
/// an unsorted listing comes back in insertion order. The sequence counter
/// only ever moves forward, which retires the id of a deleted record.
pub struct InMemoryBookRepository {
    book_sequence_generator: AtomicI64,
    books: parking_lot::RwLock<BTreeMap<BookId, BookRecord>>,
}

impl Default for InMemoryBookRepository {
    fn default() -> Self {
        Self {
            book_sequence_generator: AtomicI64::new(1),
            books: Default::default(),
        }
    }
}

impl BookRepository for InMemoryBookRepository {
    fn add_book(&self, details: BookDetails) -> Result<BookId, BookRepositoryError> {
        validate_details(&details)?;
        let id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed);
        self.books.write().insert(
            id,
            BookRecord {
                id,
                title: details.title,
                author: details.author,
                genre: details.genre,
                status: BookStatus::Available,
                due_date: None,
            },
        );
        Ok(id)
    }

    fn get_book(&self, book_id: BookId) -> Result<BookRecord, BookRepositoryError> {
        self.books
            .read()
            .get(&book_id)
            .cloned()
            .ok_or(BookRepositoryError::NotFound(book_id))
    }

    fn update_book(
        &self,
        book_id: BookId,
        patch: BookRecordPatch,
    ) -> Result<(), BookRepositoryError> {
        validate_patch(&patch)?;
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(BookRepositoryError::NotFound(book_id))?;
        patch.apply(book);
        Ok(())
    }

    fn delete_book(&self, book_id: BookId) -> Result<(), BookRepositoryError> {
        self.books
            .write()
            .remove(&book_id)
            .map(|_| ())
            .ok_or(BookRepositoryError::NotFound(book_id))
    }

    fn list_books(
        &self,
        filter: Option<&FilterSpec>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<BookRecord>, BookRepositoryError> {
        let mut records: Vec<BookRecord> = self
            .books
            .read()
            .values()
            .filter(|record| filter.map_or(true, |f| f.matches(record)))
            .cloned()
            .collect();
        if let Some(sort) = sort {
            // sort_by is stable, so equal keys stay in insertion order
            records.sort_by(|a, b| sort.field.project(a).cmp(sort.field.project(b)));
        }
        Ok(records)
    }
}
