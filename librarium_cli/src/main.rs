use std::env;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use librarium_circulation::circulation::CirculationService;
use librarium_repository::books_repository::{
    BookRepository, InMemoryBookRepository, SqliteBookRepository,
};

use crate::args::Cli;

mod args;
mod commands;
mod render;
mod shell;

fn init_telemetry() {
    // Filter based on level - trace, debug, info, warn, error
    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    // Logs go to stderr so they never mix with the rendered records
    let formatting_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let subscriber = Registry::default().with(env_filter).with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

fn main() -> anyhow::Result<()> {
    init_telemetry();
    let cli = Cli::parse();

    let use_in_memory_db = env::var("LIBRARIUM_IN_MEMORY")
        .map(|value| value.to_lowercase() == "true")
        .unwrap_or_default();
    let db_path = env::var("LIBRARIUM_DB_PATH").unwrap_or("library.db".to_string());

    let repository: Arc<dyn BookRepository> = if use_in_memory_db {
        Arc::new(InMemoryBookRepository::default())
    } else {
        Arc::new(SqliteBookRepository::init(&db_path).context("Failed to open the catalog")?)
    };
    let catalog = CirculationService::new(repository.clone());

    match cli.command {
        Some(command) => commands::run(command, repository.as_ref(), &catalog),
        None => shell::run(repository.as_ref(), &catalog),
    }
}
