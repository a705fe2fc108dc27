//! Auto-generated dispatch IDs: `<prefix>-NNN`.
//!
//! The counter is persisted with the records, but it is never trusted on its
//! own: after every load it is recomputed from the IDs actually present, and
//! each candidate is checked against existing records before being handed out.

use super::{Result, Store, StoreError};

impl Store {
    /// Returns the next free auto-generated ID and advances the counter past it.
    ///
    /// Candidates already taken (e.g. entered by hand as an override, or put
    /// back into the file by an external edit) are skipped. Fails once the
    /// counter cannot move past the next free candidate; the counter is then
    /// left as it was.
    pub fn generate_id(&mut self) -> Result<String> {
        let mut n = self.next_id.max(1);
        loop {
            let next = n.checked_add(1).ok_or(StoreError::IdsExhausted)?;
            let candidate = format_id(&self.prefix, n);
            if !self.contains_id(&candidate) {
                self.next_id = next;
                return Ok(candidate);
            }
            n = next;
        }
    }

    /// Points the counter one past the highest auto-generated suffix on record.
    ///
    /// Leaves the counter alone when no record carries an auto-generated ID.
    pub(super) fn recompute_next_id(&mut self) {
        let highest = self
            .records
            .iter()
            .filter_map(|r| parse_suffix(&self.prefix, &r.id))
            .max();
        if let Some(highest) = highest {
            // u64::MAX leaves nothing to generate; generate_id reports that.
            self.next_id = highest.saturating_add(1);
        }
    }
}

fn format_id(prefix: &str, n: u64) -> String {
    format!("{prefix}-{n:03}")
}

/// The numeric suffix of an auto-generated ID, or `None` for any other ID.
fn parse_suffix(prefix: &str, id: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
