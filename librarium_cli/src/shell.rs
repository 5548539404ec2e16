use std::io::{self, BufRead, Write};

use librarium_circulation::circulation::CirculationService;
use librarium_repository::api::{BookDetails, BookRecord, BookRecordPatch, BookStatus};
use librarium_repository::books_repository::BookRepository;
use librarium_repository::query::build_search;

use crate::render::record_line;

/// Interactive menu over the catalog. Recoverable errors (validation,
/// refused transitions, unknown ids) are printed and the menu continues;
/// only I/O failures abort the shell.
pub fn run(repository: &dyn BookRepository, catalog: &CirculationService) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!();
        println!("Library Management System");
        println!("1. Add a book");
        println!("2. Update a book");
        println!("3. Delete a book");
        println!("4. List all books");
        println!("5. Search for books");
        println!("6. Borrow a book");
        println!("7. Return a book");
        println!("8. Generate a report");
        println!("9. Exit");

        let choice = match prompt(&mut input, "Enter your choice (1-9): ")? {
            Some(choice) => choice,
            // stdin closed, treat like exit
            None => return Ok(()),
        };

        let result = match choice.as_str() {
            "1" => add_book(&mut input, repository),
            "2" => update_book(&mut input, repository),
            "3" => delete_book(&mut input, repository),
            "4" => list_books(repository),
            "5" => search_books(&mut input, repository),
            "6" => borrow_book(&mut input, catalog),
            "7" => return_book(&mut input, catalog),
            "8" => generate_report(&mut input, catalog),
            "9" => {
                println!("Exiting...");
                return Ok(());
            }
            _ => {
                println!("Invalid choice. Please enter a number from 1 to 9.");
                Ok(())
            }
        };
        if let Err(err) = result {
            println!("{err}");
        }
    }
}

/// Prints the message and reads one trimmed line. `None` means end of input.
fn prompt(input: &mut impl BufRead, message: &str) -> anyhow::Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn required(input: &mut impl BufRead, message: &str) -> anyhow::Result<String> {
    prompt(input, message)?.ok_or_else(|| anyhow::anyhow!("Input closed"))
}

fn prompt_id(input: &mut impl BufRead, message: &str) -> anyhow::Result<i64> {
    let raw = required(input, message)?;
    raw.parse()
        .map_err(|_| anyhow::anyhow!("Invalid ID {raw:?}"))
}

fn add_book(input: &mut impl BufRead, repository: &dyn BookRepository) -> anyhow::Result<()> {
    let title = required(input, "Enter the title of the book: ")?;
    let author = required(input, "Enter the author of the book: ")?;
    let genre = required(input, "Enter the genre of the book: ")?;

    repository.add_book(BookDetails {
        title: title.clone(),
        author: author.clone(),
        genre,
    })?;
    println!("Book '{title}' by {author} added.");
    Ok(())
}

fn update_book(input: &mut impl BufRead, repository: &dyn BookRepository) -> anyhow::Result<()> {
    let book_id = prompt_id(input, "Enter the ID of the book to update: ")?;
    let book = repository.get_book(book_id)?;
    println!(
        "Current details - Title: {}, Author: {}, Genre: {}",
        book.title, book.author, book.genre
    );

    // blank input keeps the current value; the due date additionally
    // accepts "none" to clear it, which blank cannot express
    let not_blank = |value: String| (!value.is_empty()).then_some(value);
    let title = not_blank(required(input, "Enter new title (leave blank to keep current): ")?);
    let author = not_blank(required(input, "Enter new author (leave blank to keep current): ")?);
    let genre = not_blank(required(input, "Enter new genre (leave blank to keep current): ")?);

    let status = match not_blank(required(
        input,
        "Enter new status (available/borrowed, leave blank to keep current): ",
    )?) {
        Some(raw) => Some(raw.parse::<BookStatus>()?),
        None => None,
    };

    let due_date = match not_blank(required(
        input,
        "Enter new due date (YYYY-MM-DD, blank to keep current, 'none' to clear): ",
    )?) {
        Some(raw) if raw == "none" => Some(None),
        Some(raw) => Some(Some(raw.parse()?)),
        None => None,
    };

    repository.update_book(
        book_id,
        BookRecordPatch {
            title,
            author,
            genre,
            status,
            due_date,
        },
    )?;
    println!("Book ID {book_id} updated.");
    Ok(())
}

fn delete_book(input: &mut impl BufRead, repository: &dyn BookRepository) -> anyhow::Result<()> {
    let book_id = prompt_id(input, "Enter the ID of the book to delete: ")?;
    let book = repository.get_book(book_id)?;

    let confirm = required(
        input,
        &format!(
            "Are you sure you want to delete '{}' by {}? (yes/no): ",
            book.title, book.author
        ),
    )?;
    if confirm.to_lowercase() == "yes" {
        repository.delete_book(book_id)?;
        println!("Book ID {book_id} deleted.");
    } else {
        println!("Deletion cancelled.");
    }
    Ok(())
}

fn list_books(repository: &dyn BookRepository) -> anyhow::Result<()> {
    let books = repository.list_books(None, None)?;
    print_result_list(&books, "List of Books", "No books found.");
    Ok(())
}

fn search_books(input: &mut impl BufRead, repository: &dyn BookRepository) -> anyhow::Result<()> {
    println!();
    println!("Search Options:");
    println!("1. Search by title");
    println!("2. Search by author");
    println!("3. Search by genre");
    println!("4. Back to main menu");

    let field = match required(input, "Enter your search option (1-4): ")?.as_str() {
        "1" => "title",
        "2" => "author",
        "3" => "genre",
        "4" => return Ok(()),
        _ => {
            println!("Invalid choice.");
            return Ok(());
        }
    };

    let value = required(input, &format!("Enter {field} to search for: "))?;
    let filter = build_search(field, value)?;
    let books = repository.list_books(Some(&filter), None)?;
    print_result_list(&books, "Search Results", "No books found.");
    Ok(())
}

fn borrow_book(input: &mut impl BufRead, catalog: &CirculationService) -> anyhow::Result<()> {
    let book_id = prompt_id(input, "Enter the ID of the book to borrow: ")?;
    let due_date = catalog.borrow_book(book_id)?;
    println!("Book ID {book_id} borrowed, due on {due_date}.");
    Ok(())
}

fn return_book(input: &mut impl BufRead, catalog: &CirculationService) -> anyhow::Result<()> {
    let book_id = prompt_id(input, "Enter the ID of the book to return: ")?;
    catalog.return_book(book_id)?;
    println!("Book ID {book_id} returned.");
    Ok(())
}

fn generate_report(input: &mut impl BufRead, catalog: &CirculationService) -> anyhow::Result<()> {
    println!();
    println!("Report Options:");
    println!("1. List of borrowed books");
    println!("2. List of overdue books");
    println!("3. Back to main menu");

    match required(input, "Enter your report option (1-3): ")?.as_str() {
        "1" => {
            let books = catalog.borrowed_report()?;
            print_result_list(&books, "List of Borrowed Books", "No borrowed books.");
        }
        "2" => {
            let books = catalog.overdue_report()?;
            print_result_list(&books, "List of Overdue Books", "No overdue books.");
        }
        "3" => {}
        _ => println!("Invalid choice."),
    }
    Ok(())
}

fn print_result_list(books: &[BookRecord], heading: &str, empty_message: &str) {
    if books.is_empty() {
        println!("{empty_message}");
        return;
    }
    println!();
    println!("{heading}:");
    for book in books {
        println!("{}", record_line(book));
    }
}
