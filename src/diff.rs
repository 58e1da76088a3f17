//! Change detection against previously persisted subdomains

use std::collections::HashSet;

/// Subdomains in `current` that are not in `persisted`, sorted.
///
/// Pure set difference on exact strings.
pub fn detect_new(current: &HashSet<String>, persisted: &HashSet<String>) -> Vec<String> {
    let mut new: Vec<String> = current.difference(persisted).cloned().collect();
    new.sort();
    new
}
