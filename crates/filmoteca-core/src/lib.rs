//! Core types and the duplicate-person merge engine for the Filmoteca
//! catalog.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! diff and merge-planning logic is pure: storage backends load
//! [`snapshot::PersonSnapshot`]s, hand them to [`diff::preview`] or
//! [`merge::plan`], and apply the resulting plan inside their own
//! transaction.

pub mod diff;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod person;
pub mod relation;
pub mod snapshot;
pub mod store;
pub mod survivor;

pub use error::{Error, Result};
