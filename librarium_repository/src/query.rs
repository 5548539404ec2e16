use crate::api::BookRecord;

/// Fields a caller may filter, sort or search on. User-supplied field names
/// are validated into this enum before any query is built; the SQL backend
/// resolves it to a fixed column identifier and never splices caller text
/// into query syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Title,
    Author,
    Genre,
    Status,
}

impl QueryField {
    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        match name {
            "title" => Ok(QueryField::Title),
            "author" => Ok(QueryField::Author),
            "genre" => Ok(QueryField::Genre),
            "status" => Ok(QueryField::Status),
            other => Err(QueryError::UnknownField(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryField::Title => "title",
            QueryField::Author => "author",
            QueryField::Genre => "genre",
            QueryField::Status => "status",
        }
    }

    /// Fixed column identifier used when compiling to SQL.
    pub(crate) fn column(&self) -> &'static str {
        // Identical to name() today, kept separate so the public names and
        // the schema can drift independently.
        self.name()
    }

    pub(crate) fn project<'a>(&self, record: &'a BookRecord) -> &'a str {
        match self {
            QueryField::Title => &record.title,
            QueryField::Author => &record.author,
            QueryField::Genre => &record.genre,
            QueryField::Status => record.status.as_str(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown field {0:?}, expected one of title, author, genre, status")]
    UnknownField(String),

    #[error("Field \"status\" cannot be searched, only title, author and genre")]
    UnsearchableField,
}

/// Case-sensitive containment match on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: QueryField,
    pub value: String,
}

impl FilterSpec {
    pub(crate) fn matches(&self, record: &BookRecord) -> bool {
        self.field.project(record).contains(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: QueryField,
}

/// Validates a listing filter. Any of the four record fields is allowed.
pub fn build_filter(field: &str, value: impl Into<String>) -> Result<FilterSpec, QueryError> {
    Ok(FilterSpec {
        field: QueryField::from_name(field)?,
        value: value.into(),
    })
}

/// Validates a search. Same containment semantics as a filter, but the
/// interactive search path never offered status, so it is rejected here.
pub fn build_search(field: &str, value: impl Into<String>) -> Result<FilterSpec, QueryError> {
    let field = QueryField::from_name(field)?;
    if field == QueryField::Status {
        return Err(QueryError::UnsearchableField);
    }
    Ok(FilterSpec {
        field,
        value: value.into(),
    })
}

pub fn build_sort(field: &str) -> Result<SortSpec, QueryError> {
    Ok(SortSpec {
        field: QueryField::from_name(field)?,
    })
}
