use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use librarium_repository::api::{BookId, BookRecord, BookRecordPatch, BookStatus};
use librarium_repository::books_repository::{BookRepository, BookRepositoryError};
use librarium_repository::query::{FilterSpec, QueryField};

use crate::clock::{Clock, SystemClock};

/// Why a borrow or return attempt was refused. Callers present both cases
/// with the same message, the distinction only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalCause {
    NotFound,
    WrongStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum CirculationError {
    #[error("Book {id} is not available for borrowing")]
    NotBorrowable { id: BookId, cause: RefusalCause },

    #[error("Book {id} is not borrowed")]
    NotReturnable { id: BookId, cause: RefusalCause },

    #[error(transparent)]
    Repository(#[from] BookRepositoryError),
}

pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Temporal policy of the catalog. The loan period is the only knob:
/// a borrowed book is due that many calendar days after the borrow date,
/// with no holiday or weekend adjustment.
#[derive(Debug, Clone, Copy)]
pub struct LoanPolicy {
    pub loan_period: Duration,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period: Duration::days(DEFAULT_LOAN_PERIOD_DAYS),
        }
    }
}

/// The borrow/return state machine, layered on a `BookRepository` handle.
///
/// Only `Available --borrow--> Borrowed --return--> Available` exists;
/// both transitions set status and due date together. Wrong-state and
/// absent-record conditions surface as `NotBorrowable`/`NotReturnable`
/// rather than leaking `NotFound`.
pub struct CirculationService {
    repository: Arc<dyn BookRepository>,
    policy: LoanPolicy,
    clock: Arc<dyn Clock>,
}

impl CirculationService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self::with_policy(repository, LoanPolicy::default(), Arc::new(SystemClock))
    }

    pub fn with_policy(
        repository: Arc<dyn BookRepository>,
        policy: LoanPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            policy,
            clock,
        }
    }

    /// Borrows an available book and returns the computed due date.
    pub fn borrow_book(&self, book_id: BookId) -> Result<NaiveDate, CirculationError> {
        let record = match self.repository.get_book(book_id) {
            Ok(record) => record,
            Err(BookRepositoryError::NotFound(_)) => {
                tracing::debug!(book_id, "Borrow refused, no such book");
                return Err(CirculationError::NotBorrowable {
                    id: book_id,
                    cause: RefusalCause::NotFound,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if record.status != BookStatus::Available {
            tracing::debug!(book_id, "Borrow refused, already borrowed");
            return Err(CirculationError::NotBorrowable {
                id: book_id,
                cause: RefusalCause::WrongStatus,
            });
        }

        let due_date = self.clock.today() + self.policy.loan_period;
        self.repository.update_book(
            book_id,
            BookRecordPatch {
                status: Some(BookStatus::Borrowed),
                due_date: Some(Some(due_date)),
                ..BookRecordPatch::default()
            },
        )?;
        tracing::info!(book_id, %due_date, "Book borrowed");
        Ok(due_date)
    }

    /// Returns a borrowed book, clearing its due date.
    pub fn return_book(&self, book_id: BookId) -> Result<(), CirculationError> {
        let record = match self.repository.get_book(book_id) {
            Ok(record) => record,
            Err(BookRepositoryError::NotFound(_)) => {
                tracing::debug!(book_id, "Return refused, no such book");
                return Err(CirculationError::NotReturnable {
                    id: book_id,
                    cause: RefusalCause::NotFound,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if record.status != BookStatus::Borrowed {
            tracing::debug!(book_id, "Return refused, not borrowed");
            return Err(CirculationError::NotReturnable {
                id: book_id,
                cause: RefusalCause::WrongStatus,
            });
        }

        self.repository.update_book(
            book_id,
            BookRecordPatch {
                status: Some(BookStatus::Available),
                due_date: Some(None),
                ..BookRecordPatch::default()
            },
        )?;
        tracing::info!(book_id, "Book returned");
        Ok(())
    }

    /// All currently borrowed books.
    pub fn borrowed_report(&self) -> Result<Vec<BookRecord>, CirculationError> {
        let filter = FilterSpec {
            field: QueryField::Status,
            value: BookStatus::Borrowed.as_str().to_string(),
        };
        Ok(self.repository.list_books(Some(&filter), None)?)
    }

    /// Borrowed books whose due date lies strictly before today.
    /// A book due today is not yet overdue.
    pub fn overdue_report(&self) -> Result<Vec<BookRecord>, CirculationError> {
        let today = self.clock.today();
        let mut records = self.borrowed_report()?;
        // a record left without a due date by a raw update is never overdue
        records.retain(|record| matches!(record.due_date, Some(due) if due < today));
        Ok(records)
    }
}

#[cfg(test)]
mod circulation_tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};

    use librarium_repository::api::{BookDetails, BookId, BookStatus};
    use librarium_repository::books_repository::{BookRepository, InMemoryBookRepository};

    use crate::clock::FixedClock;

    use super::{CirculationError, CirculationService, LoanPolicy, RefusalCause};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn service_with_repo() -> (Arc<InMemoryBookRepository>, CirculationService) {
        let repo = Arc::new(InMemoryBookRepository::default());
        let service = CirculationService::with_policy(
            repo.clone(),
            LoanPolicy::default(),
            Arc::new(FixedClock(today())),
        );
        (repo, service)
    }

    fn add_book(repo: &InMemoryBookRepository, title: &str) -> BookId {
        repo.add_book(BookDetails {
            title: title.to_string(),
            author: "author".to_string(),
            genre: "genre".to_string(),
        })
        .expect("Failed to add book")
    }

    /// Status and due date must stay coupled after every transition
    fn assert_invariant(repo: &InMemoryBookRepository, id: BookId) {
        let record = repo.get_book(id).unwrap();
        assert_eq!(
            record.status == BookStatus::Borrowed,
            record.due_date.is_some()
        );
    }

    #[test]
    /// Covers the borrow transition
    /// 1. Borrowing an absent book is refused
    /// 2. Borrowing an available book sets status and today + 14 days
    /// 3. Borrowing it again is refused and changes nothing
    fn test_borrow_book() {
        let (repo, service) = service_with_repo();

        let missing = service.borrow_book(42);
        assert!(matches!(
            missing,
            Err(CirculationError::NotBorrowable {
                id: 42,
                cause: RefusalCause::NotFound
            })
        ));

        let id = add_book(&repo, "book");
        assert_invariant(&repo, id);

        let due_date = service.borrow_book(id).expect("Failed to borrow");
        assert_eq!(due_date, today() + Duration::days(14));

        let record = repo.get_book(id).unwrap();
        assert_eq!(record.status, BookStatus::Borrowed);
        assert_eq!(record.due_date, Some(due_date));
        assert_invariant(&repo, id);

        let second_borrow = service.borrow_book(id);
        assert!(matches!(
            second_borrow,
            Err(CirculationError::NotBorrowable {
                cause: RefusalCause::WrongStatus,
                ..
            })
        ));
        assert_eq!(repo.get_book(id).unwrap(), record);
    }

    #[test]
    /// Covers the return transition
    /// 1. Returning an absent book is refused
    /// 2. Returning an available book is refused and changes nothing
    /// 3. Returning a borrowed book clears the due date
    fn test_return_book() {
        let (repo, service) = service_with_repo();

        let missing = service.return_book(42);
        assert!(matches!(
            missing,
            Err(CirculationError::NotReturnable {
                id: 42,
                cause: RefusalCause::NotFound
            })
        ));

        let id = add_book(&repo, "book");
        let before = repo.get_book(id).unwrap();
        let not_borrowed = service.return_book(id);
        assert!(matches!(
            not_borrowed,
            Err(CirculationError::NotReturnable {
                cause: RefusalCause::WrongStatus,
                ..
            })
        ));
        assert_eq!(repo.get_book(id).unwrap(), before);

        service.borrow_book(id).expect("Failed to borrow");
        service.return_book(id).expect("Failed to return");

        let record = repo.get_book(id).unwrap();
        assert_eq!(record.status, BookStatus::Available);
        assert_eq!(record.due_date, None);
        assert_invariant(&repo, id);
    }

    #[test]
    /// Covers both reports with one available book, one due in the future
    /// and one overdue; a book due exactly today must not count as overdue
    fn test_borrowed_and_overdue_reports() {
        let repo = Arc::new(InMemoryBookRepository::default());

        let _r1 = add_book(&repo, "available");
        let r2 = add_book(&repo, "due in 5 days");
        let r3 = add_book(&repo, "overdue");
        let r4 = add_book(&repo, "due today");

        // back-date the borrows so the due dates land in the future,
        // in the past and exactly on today
        let borrow = |id: BookId, on: NaiveDate| {
            CirculationService::with_policy(
                repo.clone(),
                LoanPolicy::default(),
                Arc::new(FixedClock(on)),
            )
            .borrow_book(id)
            .expect("Failed to borrow")
        };
        borrow(r2, today() - Duration::days(9));
        borrow(r3, today() - Duration::days(16));
        borrow(r4, today() - Duration::days(14));

        let service = CirculationService::with_policy(
            repo.clone(),
            LoanPolicy::default(),
            Arc::new(FixedClock(today())),
        );

        let borrowed: Vec<_> = service
            .borrowed_report()
            .expect("Failed to report")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(borrowed, vec![r2, r3, r4]);

        let overdue: Vec<_> = service
            .overdue_report()
            .expect("Failed to report")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(overdue, vec![r3]);
    }

    #[test]
    /// The loan period is policy, not a constant baked into the transition
    fn test_loan_period_is_overridable() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let service = CirculationService::with_policy(
            repo.clone(),
            LoanPolicy {
                loan_period: Duration::days(3),
            },
            Arc::new(FixedClock(today())),
        );

        let id = add_book(&repo, "short loan");
        let due_date = service.borrow_book(id).expect("Failed to borrow");
        assert_eq!(due_date, today() + Duration::days(3));
    }
}
