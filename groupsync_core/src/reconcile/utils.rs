//! reconciliation utility functions

use std::collections::BTreeSet;

use crate::changeset::Membership;

/// Diff two sets, returning (everything only in `desired`, everything only in `current`).
pub(crate) fn diff_sets<'a>(
    desired: &'a BTreeSet<String>,
    current: &'a BTreeSet<String>,
) -> (
    impl Iterator<Item = &'a String>,
    impl Iterator<Item = &'a String>,
) {
    (desired.difference(current), current.difference(desired))
}

/// Membership changes needed to go from `current` to `desired`.
pub(crate) fn membership_between(
    desired: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> Membership {
    let (add, remove) = diff_sets(desired, current);
    Membership {
        add: add.cloned().collect(),
        remove: remove.cloned().collect(),
    }
}
