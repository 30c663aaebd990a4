//! SQLite backend for the Filmoteca person store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Previews read inside one deferred
//! transaction; merges run inside one `IMMEDIATE` transaction, which takes
//! the write lock before the candidates are read.

mod encode;
mod executor;
mod read;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
