pub mod api;
pub mod books_repository;
pub mod query;
