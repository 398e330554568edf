//! The owner ID that scopes every financial record.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for integer owner IDs.
///
/// Every record in the ledger belongs to exactly one owner and every query is
/// scoped by it. Wrapping the integer keeps owner IDs from being mixed up with
/// record IDs at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct OwnerId(i64);

impl OwnerId {
    /// Create a new owner ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the owner ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
