//! IOC aggregation by `(type, value)` identity.
//!
//! Two indicators are the same iff type and value match exactly
//! (case-sensitive, no normalization). A first sighting starts at count 1;
//! every further contributing indicator increments the existing entry.

use crate::types::{CaseIoc, Indicator};

/// Merge indicators into an aggregated list, preserving first-sighting order.
///
/// Returns the number of entries that were newly appended.
pub fn merge_iocs(target: &mut Vec<CaseIoc>, incoming: &[Indicator]) -> usize {
    let mut added = 0;
    for indicator in incoming {
        match target
            .iter_mut()
            .find(|i| i.ioc_type == indicator.ioc_type && i.value == indicator.value)
        {
            Some(existing) => existing.count = existing.count.saturating_add(1),
            None => {
                target.push(CaseIoc {
                    ioc_type: indicator.ioc_type.clone(),
                    value: indicator.value.clone(),
                    count: 1,
                });
                added += 1;
            }
        }
    }
    added
}

/// Build an aggregated list from a single alert's indicators.
pub fn seed_iocs(indicators: &[Indicator]) -> Vec<CaseIoc> {
    let mut iocs = Vec::with_capacity(indicators.len());
    merge_iocs(&mut iocs, indicators);
    iocs
}
