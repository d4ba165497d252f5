//! Listing records
//!
//! This module holds the unit of output and everything that decides whether
//! a parsed listing becomes one:
//! - `RawListing`: the parser's unvalidated view of a single listing
//! - `Record`: the normalized, validated listing
//! - `normalize`: raw listing -> record, or a rejection reason
//! - `Deduplicator`: run-wide first-seen-wins identity filter

mod dedup;
mod normalize;

pub use dedup::{Deduplicator, IdentityKey};
pub use normalize::{normalize, normalize_phone, RejectReason, PHONE_DIGITS};

/// Sentinel stored in `website` when a listing has no outbound link
pub const WEBSITE_SENTINEL: &str = "N/A";

/// Separator used when categories are flattened into a single column
///
/// Directory tags are short phrases that may contain commas or ampersands
/// ("Pool, Spa & Hot Tub Repair") but never a pipe.
pub const CATEGORY_DELIMITER: &str = " | ";

/// Candidate record extracted from one listing, before normalization
///
/// Every field is exactly as the page presented it; absent sub-elements are
/// `None` (or an empty `categories`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub name: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub categories: Vec<String>,
}

/// One accepted business listing
///
/// All five fields are always present so output columns stay uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Display name; never empty
    pub name: String,

    /// Outbound website, or [`WEBSITE_SENTINEL`]
    pub website: String,

    /// Canonical `NNN-NNN-NNNN` phone, or empty if absent or unusable
    pub phone: String,

    /// Category tags in order of appearance
    pub categories: Vec<String>,

    /// Region code of the search that produced this record
    pub region: String,
}

impl Record {
    /// Returns true if the record carries a real website rather than the sentinel
    pub fn has_website(&self) -> bool {
        self.website != WEBSITE_SENTINEL
    }

    /// Categories flattened with [`CATEGORY_DELIMITER`]
    pub fn joined_categories(&self) -> String {
        self.categories.join(CATEGORY_DELIMITER)
    }

    /// Identity used for run-wide deduplication
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::for_record(self)
    }
}
