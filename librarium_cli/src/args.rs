use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use librarium_repository::api::{BookId, BookStatus};

/// Single-user library catalog manager
#[derive(Parser, Debug)]
#[command(name = "librarium")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Without a subcommand the interactive shell is started
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a book to the catalog
    Add {
        title: String,
        author: String,
        genre: String,
    },

    /// Update fields of an existing record; omitted fields keep their value
    Update {
        id: BookId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// available or borrowed (raw override, not coupled to the due date)
        #[arg(long)]
        status: Option<BookStatus>,
        /// New due date as YYYY-MM-DD
        #[arg(long)]
        due_date: Option<NaiveDate>,
        /// Clear the stored due date
        #[arg(long, conflicts_with = "due_date")]
        clear_due_date: bool,
    },

    /// Delete a record permanently
    Delete { id: BookId },

    /// List the catalog
    List {
        /// Sort by title, author, genre or status
        #[arg(long)]
        sort_by: Option<String>,
        /// Field to filter on: title, author, genre or status
        #[arg(long, requires = "filter_value")]
        filter_by: Option<String>,
        /// Substring the filtered field must contain (case-sensitive)
        #[arg(long, requires = "filter_by")]
        filter_value: Option<String>,
        /// Print records as JSON instead of lines
        #[arg(long)]
        json: bool,
    },

    /// Search by title, author or genre
    Search {
        field: String,
        value: String,
        #[arg(long)]
        json: bool,
    },

    /// Borrow a book
    Borrow { id: BookId },

    /// Return a borrowed book
    Return { id: BookId },

    /// Report on circulation state
    Report {
        kind: ReportKind,
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ReportKind {
    /// All currently borrowed books
    Borrowed,
    /// Borrowed books past their due date
    Overdue,
}
