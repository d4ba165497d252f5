//! Run-wide duplicate suppression

use crate::record::Record;
use std::collections::HashSet;

/// Identity of a business for deduplication purposes
///
/// The name (case-folded) is always part of the key. It is paired with the
/// strongest discriminator the record has: the phone, else the website, else
/// the region. Records with a phone or website therefore collapse across
/// regions, while name-only records are only merged within one region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Phone { name: String, phone: String },
    Website { name: String, website: String },
    NameInRegion { name: String, region: String },
}

impl IdentityKey {
    /// Derives the key for a record
    pub fn for_record(record: &Record) -> Self {
        let name = fold_name(&record.name);

        if !record.phone.is_empty() {
            Self::Phone {
                name,
                phone: record.phone.clone(),
            }
        } else if record.has_website() {
            Self::Website {
                name,
                website: record.website.to_lowercase(),
            }
        } else {
            Self::NameInRegion {
                name,
                region: record.region.clone(),
            }
        }
    }
}

/// Lowercases and collapses internal whitespace
fn fold_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First-seen-wins set of identity keys
///
/// One instance is shared by every region of a run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<IdentityKey>,
}

impl Deduplicator {
    /// Creates an empty deduplicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a record if its identity has not been seen yet
    ///
    /// # Returns
    ///
    /// * `true` - First occurrence; the key is now recorded
    /// * `false` - Duplicate; nothing changes
    pub fn admit(&mut self, record: &Record) -> bool {
        self.admit_key(record.identity_key())
    }

    /// Key-level form of [`Deduplicator::admit`]
    pub fn admit_key(&mut self, key: IdentityKey) -> bool {
        self.seen.insert(key)
    }

    /// Number of distinct identities admitted so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
