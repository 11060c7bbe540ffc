//! # Pocket Classroom CLI
//!
//! A terminal client for studying capsules: short units of notes, flashcards and
//! quiz questions, with known cards and best quiz scores remembered between runs.
//!
//! ## Architecture
//!
//! The binary is a thin UI client over the `pocketclassapp` library:
//!
//! ```text
//! main.rs -> cli::run() -> ClassroomApi -> commands / progress tracker -> FileStore
//! ```
//!
//! - **CLI** ([`cli`]): argument parsing, terminal rendering, the interactive quiz loop
//! - **API** (`pocketclassapp::api`): the facade every client goes through
//! - **Store** (`pocketclassapp::store`): one JSON file per storage key in the data directory
//!
//! Everything that touches stdout, stdin or the exit code lives here. The library
//! returns structured results and never prints.
//!
//! ## Data Directory
//!
//! Capsules are kept in the OS data directory unless `--data <DIR>` or the
//! `POCKETCLASS_DATA` environment variable points elsewhere. A `pocketclass.toml`
//! in that directory configures the best-score penalty and quiz feedback delay.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
