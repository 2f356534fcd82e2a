//! Persistence for the yatube content model.
//!
//! [`ContentStore`] is the interface the API layer programs against.
//! [`DbClient`] implements it on Postgres, [`MemoryStore`] in process memory.

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
mod record;
pub mod store;

pub use client::{DbClient, MIGRATOR};
pub use config::DbConfig;
pub use error::{ConstraintViolation, DbError, Result, constraint};
pub use memory::MemoryStore;
pub use store::ContentStore;
