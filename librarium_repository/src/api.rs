use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type BookId = i64;

/// Circulation state of a single catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl BookStatus {
    /// String form used both for display and for the durable store.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid status {0:?}, expected \"available\" or \"borrowed\"")]
pub struct InvalidStatus(pub String);

impl std::str::FromStr for BookStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Struct containing the fields supplied when a book is added to the catalog
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Struct representing a single book record as held by the store
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub status: BookStatus,
    /// Present exactly when `status` is `Borrowed`. The raw update path
    /// can break that coupling; borrow/return never do.
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Struct representing a patch to a book record. Allows to specify only a few
/// fields and leave the current values for the rest. For `due_date` the outer
/// `Option` marks "field supplied" and the inner one the stored value, so
/// `Some(None)` clears the date while `None` keeps whatever is there.
pub struct BookRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl BookRecordPatch {
    /// Overwrites exactly the fields the patch supplies.
    pub fn apply(&self, record: &mut BookRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(author) = &self.author {
            record.author = author.clone();
        }
        if let Some(genre) = &self.genre {
            record.genre = genre.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(due_date) = self.due_date {
            record.due_date = due_date;
        }
    }
}
