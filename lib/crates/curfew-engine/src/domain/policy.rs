//! Pure policy transitions.
//!
//! Each function returns `None` when the requested state is already in
//! effect, so callers can skip the write and leave the revision alone.

use std::collections::BTreeSet;

use curfew_common::Policy;

fn bumped(mut next: Policy) -> Policy {
    next.revision += 1;
    next
}

/// Restrict or allow one group (canonical name).
#[must_use]
pub fn with_restriction(current: &Policy, group: &str, restricted: bool) -> Option<Policy> {
    if current.is_restricted(group) == restricted {
        return None;
    }
    let mut next = current.clone();
    if restricted {
        next.restricted_groups.insert(group.to_string());
    } else {
        next.restricted_groups.remove(group);
    }
    Some(bumped(next))
}

/// Set the global internet flag.
#[must_use]
pub fn with_internet_blocked(current: &Policy, blocked: bool) -> Option<Policy> {
    if current.internet_blocked == blocked {
        return None;
    }
    let mut next = current.clone();
    next.internet_blocked = blocked;
    Some(bumped(next))
}

/// Replace the whole restriction state.
#[must_use]
pub fn with_state(current: &Policy, groups: BTreeSet<String>, blocked: bool) -> Option<Policy> {
    if current.restricted_groups == groups && current.internet_blocked == blocked {
        return None;
    }
    Some(bumped(Policy {
        restricted_groups: groups,
        internet_blocked: blocked,
        revision: current.revision,
    }))
}

/// Back to the initial state: nothing restricted, internet allowed.
#[must_use]
pub fn reset(current: &Policy) -> Option<Policy> {
    with_state(current, BTreeSet::new(), false)
}

/// Drop names that no longer exist in the catalog.
#[must_use]
pub fn without_groups(current: &Policy, stale: &[String]) -> Option<Policy> {
    let remaining: BTreeSet<String> = current
        .restricted_groups
        .iter()
        .filter(|g| !stale.contains(g))
        .cloned()
        .collect();
    if remaining.len() == current.restricted_groups.len() {
        return None;
    }
    let mut next = current.clone();
    next.restricted_groups = remaining;
    Some(bumped(next))
}
