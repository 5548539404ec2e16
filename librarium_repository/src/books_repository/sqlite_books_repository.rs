use std::path::Path;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::api::{BookDetails, BookId, BookRecord, BookRecordPatch, BookStatus};
use crate::books_repository::{
    validate_details, validate_patch, BookRepository, BookRepositoryError,
};
use crate::query::{FilterSpec, SortSpec};

/// Durable catalog backed by a single-table SQLite database.
///
/// AUTOINCREMENT keeps the id sequence strictly increasing across deletes,
/// so a retired id is never handed out again, even after reopening the
/// file. Status is stored as `available`/`borrowed` text and due dates as
/// ISO `YYYY-MM-DD`, matching the line format the collaborators print.
pub struct SqliteBookRepository {
    conn: parking_lot::Mutex<Connection>,
}

impl SqliteBookRepository {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn init(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database at {}", path.display()))?;
        conn.execute_batch(
            "
        CREATE TABLE IF NOT EXISTS books (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            genre           TEXT NOT NULL,
            status          TEXT NOT NULL,
            due_date        TEXT
            )
        ",
        )
        .context("Failed to set up books table")?;
        tracing::debug!("Opened book catalog at {}", path.display());
        Ok(Self {
            conn: parking_lot::Mutex::new(conn),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
    let status: String = row.get(4)?;
    let status = status.parse::<BookStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(BookRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        status,
        due_date: row.get(5)?,
    })
}

const SELECT_COLUMNS: &str = "SELECT id, title, author, genre, status, due_date FROM books";

impl BookRepository for SqliteBookRepository {
    fn add_book(&self, details: BookDetails) -> Result<BookId, BookRepositoryError> {
        validate_details(&details)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO books (title, author, genre, status, due_date) VALUES (?1, ?2, ?3, ?4, NULL)",
            params![
                details.title,
                details.author,
                details.genre,
                BookStatus::Available.as_str()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_book(&self, book_id: BookId) -> Result<BookRecord, BookRepositoryError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            [book_id],
            record_from_row,
        )
        .optional()?
        .ok_or(BookRepositoryError::NotFound(book_id))
    }

    fn update_book(
        &self,
        book_id: BookId,
        patch: BookRecordPatch,
    ) -> Result<(), BookRepositoryError> {
        validate_patch(&patch)?;
        let conn = self.conn.lock();
        let mut record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [book_id],
                record_from_row,
            )
            .optional()?
            .ok_or(BookRepositoryError::NotFound(book_id))?;
        patch.apply(&mut record);
        // the whole row is rewritten in one statement, so the mutation
        // stays a single atomic write
        conn.execute(
            "UPDATE books SET title = ?1, author = ?2, genre = ?3, status = ?4, due_date = ?5 WHERE id = ?6",
            params![
                record.title,
                record.author,
                record.genre,
                record.status.as_str(),
                record.due_date,
                book_id
            ],
        )?;
        Ok(())
    }

    fn delete_book(&self, book_id: BookId) -> Result<(), BookRepositoryError> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM books WHERE id = ?1", [book_id])?;
        if deleted == 0 {
            return Err(BookRepositoryError::NotFound(book_id));
        }
        Ok(())
    }

    fn list_books(
        &self,
        filter: Option<&FilterSpec>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<BookRecord>, BookRepositoryError> {
        // Column identifiers come from the fixed QueryField mapping; caller
        // text only ever travels as a bound parameter. instr() is used
        // instead of LIKE to keep the containment match case-sensitive.
        let mut sql = SELECT_COLUMNS.to_string();
        if let Some(filter) = filter {
            sql.push_str(" WHERE instr(");
            sql.push_str(filter.field.column());
            sql.push_str(", ?1) > 0");
        }
        sql.push_str(" ORDER BY ");
        if let Some(sort) = sort {
            sql.push_str(sort.field.column());
            // id as tie-breaker keeps equal keys in insertion order
            sql.push_str(", id");
        } else {
            sql.push_str("id");
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = match filter {
            Some(filter) => stmt.query_map([&filter.value], record_from_row)?,
            None => stmt.query_map([], record_from_row)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod sqlite_book_repository_tests {
    use chrono::NaiveDate;

    use crate::api::{BookDetails, BookRecordPatch, BookStatus};
    use crate::books_repository::{BookRepository, BookRepositoryError, SqliteBookRepository};
    use crate::query::{build_filter, build_sort};

    fn details(title: &str, author: &str, genre: &str) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
        }
    }

    #[test]
    /// Tests add_book, get_book and update_book against a real database file
    /// for the sake of not reopening the file multiple times it tests
    /// everything in one testcase
    fn test_add_book_patch_and_get_it() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo =
            SqliteBookRepository::init(dir.path().join("library.db")).expect("Failed to init");

        let not_existing_book_id = 20000;
        assert!(matches!(
            repo.get_book(not_existing_book_id),
            Err(BookRepositoryError::NotFound(..))
        ));
        assert!(matches!(
            repo.add_book(details("", "a", "g")),
            Err(BookRepositoryError::Validation(..))
        ));

        let id = repo
            .add_book(details("xx", "sss", "aaad"))
            .expect("Failed to add book");
        let record = repo.get_book(id).expect("Failed to get book");
        assert_eq!(record.status, BookStatus::Available);
        assert_eq!(record.due_date, None);

        repo.update_book(
            id,
            BookRecordPatch {
                title: Some("patchedTitle".to_string()),
                ..BookRecordPatch::default()
            },
        )
        .expect("Failed to patch");

        let after = repo.get_book(id).unwrap();
        assert_eq!(after.title, "patchedTitle");
        assert_eq!(after.author, "sss");
        assert_eq!(after.genre, "aaad");
        assert_eq!(after.status, BookStatus::Available);
        assert_eq!(after.due_date, None);

        // due date survives a round trip through the TEXT column
        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        repo.update_book(
            id,
            BookRecordPatch {
                status: Some(BookStatus::Borrowed),
                due_date: Some(Some(due)),
                ..BookRecordPatch::default()
            },
        )
        .expect("Failed to patch");
        let after = repo.get_book(id).unwrap();
        assert_eq!(after.status, BookStatus::Borrowed);
        assert_eq!(after.due_date, Some(due));

        repo.update_book(
            id,
            BookRecordPatch {
                status: Some(BookStatus::Available),
                due_date: Some(None),
                ..BookRecordPatch::default()
            },
        )
        .expect("Failed to patch");
        assert_eq!(repo.get_book(id).unwrap().due_date, None);
    }

    #[test]
    /// Tests listing with filters and sorts compiled to SQL
    fn test_add_books_and_list_them() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo =
            SqliteBookRepository::init(dir.path().join("library.db")).expect("Failed to init");

        let list = repo.list_books(None, None).expect("Failed to list books");
        assert_eq!(list, vec![]);

        let id_1 = repo
            .add_book(details("Zebra Stories", "Adams", "fiction"))
            .expect("Failed to add book");
        let id_2 = repo
            .add_book(details("Aardvark Atlas", "Brown", "reference"))
            .expect("Failed to add book");

        let unsorted: Vec<_> = repo
            .list_books(None, None)
            .expect("Failed to list books")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(unsorted, vec![id_1, id_2]);

        let by_title: Vec<_> = repo
            .list_books(None, Some(&build_sort("title").unwrap()))
            .expect("Failed to list books")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(by_title, vec![id_2, id_1]);

        // containment is case-sensitive, unlike SQLite's LIKE
        let filtered = repo
            .list_books(Some(&build_filter("author", "Ada").unwrap()), None)
            .expect("Failed to list books");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, id_1);

        let filtered = repo
            .list_books(Some(&build_filter("author", "ada").unwrap()), None)
            .expect("Failed to list books");
        assert!(filtered.is_empty());

        let filtered = repo
            .list_books(Some(&build_filter("status", "borrowed").unwrap()), None)
            .expect("Failed to list books");
        assert!(filtered.is_empty());
    }

    #[test]
    /// Tests that a deleted id is retired for good, including across a
    /// reopen of the same database file
    fn test_delete_book_retires_its_id() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("library.db");

        let first_id;
        {
            let repo = SqliteBookRepository::init(&db_path).expect("Failed to init");
            first_id = repo
                .add_book(details("one", "a", "g"))
                .expect("Failed to add book");
            repo.delete_book(first_id).expect("Failed to delete book");
            assert!(matches!(
                repo.get_book(first_id),
                Err(BookRepositoryError::NotFound(..))
            ));
            assert!(matches!(
                repo.delete_book(first_id),
                Err(BookRepositoryError::NotFound(..))
            ));
        }

        let repo = SqliteBookRepository::init(&db_path).expect("Failed to reopen");
        let next_id = repo
            .add_book(details("two", "b", "g"))
            .expect("Failed to add book");
        assert!(next_id > first_id);
    }
}
