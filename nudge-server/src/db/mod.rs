//! Database access layer for nudge-server
//!
//! One module per table, plus the rating store which owns the
//! upsert-plus-recompute transaction.

use nudge_common::{Error, Result};
use uuid::Uuid;

pub mod challenges;
pub mod content;
pub mod follows;
pub mod goals;
pub mod media;
pub mod questions;
pub mod ratings;
pub mod users;

/// Parse a guid column read back from the database
pub(crate) fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid guid in database: {}", e)))
}
