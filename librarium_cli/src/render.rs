use librarium_repository::api::BookRecord;

/// Line format shared by the subcommands and the interactive shell.
pub fn record_line(record: &BookRecord) -> String {
    let due_date = record
        .due_date
        .map(|date| date.to_string())
        .unwrap_or_default();
    format!(
        "ID: {}, Title: {}, Author: {}, Genre: {}, Status: {}, Due Date: {}",
        record.id, record.title, record.author, record.genre, record.status, due_date
    )
}

/// Prints records either as lines or as a JSON array. An empty result
/// prints the given message instead.
pub fn print_records(
    records: &[BookRecord],
    json: bool,
    empty_message: &str,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("{empty_message}");
    } else {
        for record in records {
            println!("{}", record_line(record));
        }
    }
    Ok(())
}

#[cfg(test)]
mod render_tests {
    use chrono::NaiveDate;

    use librarium_repository::api::{BookRecord, BookStatus};

    use super::record_line;

    #[test]
    fn record_line_matches_the_report_format() {
        let mut record = BookRecord {
            id: 3,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: "scifi".to_string(),
            status: BookStatus::Available,
            due_date: None,
        };
        assert_eq!(
            record_line(&record),
            "ID: 3, Title: Dune, Author: Herbert, Genre: scifi, Status: available, Due Date: "
        );

        record.status = BookStatus::Borrowed;
        record.due_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert_eq!(
            record_line(&record),
            "ID: 3, Title: Dune, Author: Herbert, Genre: scifi, Status: borrowed, Due Date: 2024-07-01"
        );
    }
}
