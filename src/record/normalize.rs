//! Record validation and field canonicalization

use crate::record::{RawListing, Record, WEBSITE_SENTINEL};
use std::fmt;

/// Digits in a complete North American phone number
pub const PHONE_DIGITS: usize = 10;

/// Why a raw listing did not become a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Name missing or blank after trimming
    EmptyName,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "empty name"),
        }
    }
}

/// Converts a raw listing into a validated record for `region`
///
/// # Field Rules
///
/// | Field | Rule |
/// |-------|------|
/// | name | trimmed; empty -> `RejectReason::EmptyName` |
/// | website | trimmed; absent or blank -> `"N/A"` |
/// | phone | see [`normalize_phone`] |
/// | categories | each trimmed, blanks dropped, order and repeats kept |
/// | region | taken from the search, never from the page |
///
/// # Example
///
/// ```
/// use listing_sweep::record::{normalize, RawListing};
///
/// let raw = RawListing {
///     name: Some("  A Pools ".to_string()),
///     phone: Some("(555) 123-4567".to_string()),
///     ..RawListing::default()
/// };
/// let record = normalize(raw, "NJ").unwrap();
/// assert_eq!(record.name, "A Pools");
/// assert_eq!(record.phone, "555-123-4567");
/// assert_eq!(record.website, "N/A");
/// ```
pub fn normalize(raw: RawListing, region: &str) -> Result<Record, RejectReason> {
    let name = raw.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(RejectReason::EmptyName);
    }

    let website = raw
        .website
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .unwrap_or(WEBSITE_SENTINEL)
        .to_string();

    let phone = raw.phone.as_deref().map(normalize_phone).unwrap_or_default();

    let categories = raw
        .categories
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Record {
        name: name.to_string(),
        website,
        phone,
        categories,
        region: region.to_string(),
    })
}

/// Canonicalizes a phone number to `NNN-NNN-NNNN`
///
/// All non-digits are stripped. A leading country code `1` on an 11-digit
/// number is dropped; any digits past the tenth (extensions) are ignored.
/// Fewer than ten digits yields an empty string rather than a partial number.
pub fn normalize_phone(raw: &str) -> String {
    let mut digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == PHONE_DIGITS + 1 && digits[0] == '1' {
        digits.remove(0);
    }

    if digits.len() < PHONE_DIGITS {
        return String::new();
    }

    let area: String = digits[0..3].iter().collect();
    let exchange: String = digits[3..6].iter().collect();
    let line: String = digits[6..10].iter().collect();
    format!("{}-{}-{}", area, exchange, line)
}
