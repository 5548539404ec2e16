use librarium_circulation::circulation::CirculationService;
use librarium_repository::api::{BookDetails, BookRecordPatch};
use librarium_repository::books_repository::BookRepository;
use librarium_repository::query::{build_filter, build_search, build_sort};

use crate::args::{Command, ReportKind};
use crate::render::print_records;

/// Runs a single subcommand against the catalog. Errors bubble up to main,
/// which prints them and exits non-zero.
pub fn run(
    command: Command,
    repository: &dyn BookRepository,
    catalog: &CirculationService,
) -> anyhow::Result<()> {
    match command {
        Command::Add {
            title,
            author,
            genre,
        } => {
            let id = repository.add_book(BookDetails {
                title: title.clone(),
                author: author.clone(),
                genre,
            })?;
            println!("Book '{title}' by {author} added with ID {id}.");
        }

        Command::Update {
            id,
            title,
            author,
            genre,
            status,
            due_date,
            clear_due_date,
        } => {
            let due_date = if clear_due_date {
                Some(None)
            } else {
                due_date.map(Some)
            };
            repository.update_book(
                id,
                BookRecordPatch {
                    title,
                    author,
                    genre,
                    status,
                    due_date,
                },
            )?;
            println!("Book ID {id} updated.");
        }

        Command::Delete { id } => {
            repository.delete_book(id)?;
            println!("Book ID {id} deleted.");
        }

        Command::List {
            sort_by,
            filter_by,
            filter_value,
            json,
        } => {
            let filter = match filter_by.zip(filter_value) {
                Some((field, value)) => Some(build_filter(&field, value)?),
                None => None,
            };
            let sort = match sort_by {
                Some(field) => Some(build_sort(&field)?),
                None => None,
            };
            let records = repository.list_books(filter.as_ref(), sort.as_ref())?;
            print_records(&records, json, "No books found.")?;
        }

        Command::Search { field, value, json } => {
            let filter = build_search(&field, value)?;
            let records = repository.list_books(Some(&filter), None)?;
            print_records(&records, json, "No books found.")?;
        }

        Command::Borrow { id } => {
            let due_date = catalog.borrow_book(id)?;
            println!("Book ID {id} borrowed, due on {due_date}.");
        }

        Command::Return { id } => {
            catalog.return_book(id)?;
            println!("Book ID {id} returned.");
        }

        Command::Report { kind, json } => match kind {
            ReportKind::Borrowed => {
                let records = catalog.borrowed_report()?;
                print_records(&records, json, "No borrowed books.")?;
            }
            ReportKind::Overdue => {
                let records = catalog.overdue_report()?;
                print_records(&records, json, "No overdue books.")?;
            }
        },
    }
    Ok(())
}
