//! Property-based tests for catalog validation and normalization.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use curfew_engine::domain::catalog::{DOMAIN_RE, DomainCatalog, normalize_domains, normalize_name};
use curfew_engine::domain::CatalogError;

proptest! {
    /// Normalized names start upper-case, continue lower-case, and are stable.
    #[test]
    fn prop_normalized_name_is_idempotent(raw in "[ ]{0,2}[A-Za-z][A-Za-z0-9 ]{0,15}[ ]{0,2}") {
        let name = normalize_name(&raw).unwrap();
        prop_assert_eq!(normalize_name(&name).unwrap(), name.clone());
        let mut chars = name.chars();
        let first = chars.next().unwrap();
        prop_assert!(!first.is_lowercase());
        prop_assert!(chars.all(|c| !c.is_uppercase()));
    }

    /// Valid domains come back lower-cased, de-duplicated, in first-seen order.
    #[test]
    fn prop_valid_domains_are_lowercased_and_deduplicated(
        labels in prop::collection::vec("[A-Za-z0-9]{1,8}\\.[A-Za-z]{2,5}", 1..8),
    ) {
        let out = normalize_domains("Test", &labels).unwrap();
        let mut expected: Vec<String> = Vec::new();
        for d in &labels {
            let lowered = d.to_lowercase();
            if !expected.contains(&lowered) {
                expected.push(lowered);
            }
        }
        prop_assert_eq!(out, expected);
    }

    /// Anything with a character outside the accepted set is rejected.
    #[test]
    fn prop_domains_with_bad_characters_rejected(
        prefix in "[a-z]{1,6}",
        bad in "[ _/:@!*]",
        suffix in "[a-z]{1,6}\\.com",
    ) {
        let domain = format!("{prefix}{bad}{suffix}");
        prop_assert!(!DOMAIN_RE.is_match(&domain));
        let err = normalize_domains("Test", &[domain.clone()]).unwrap_err();
        prop_assert_eq!(err, CatalogError::InvalidDomain(domain));
    }

    /// A failed add leaves the catalog exactly as it was.
    #[test]
    fn prop_failed_add_is_atomic(valid in prop::collection::vec("[a-z]{1,8}\\.com", 0..4)) {
        let mut catalog = DomainCatalog::with_builtins();
        let mut domains = valid.clone();
        domains.push("not a domain".to_string());
        prop_assert!(catalog.add_group("Custom", &domains).is_err());
        prop_assert_eq!(catalog.list_available(), vec!["YouTube".to_string(), "TikTok".to_string()]);
    }

    /// Resolution never yields duplicates, whatever the selection.
    #[test]
    fn prop_resolve_has_no_duplicates(pick_youtube in any::<bool>(), pick_tiktok in any::<bool>()) {
        let catalog = DomainCatalog::with_builtins();
        let mut names = Vec::new();
        if pick_youtube { names.push("YouTube".to_string()); }
        if pick_tiktok { names.push("TikTok".to_string()); }
        let domains = catalog.resolve(&names).unwrap();
        let unique: std::collections::BTreeSet<&String> = domains.iter().collect();
        prop_assert_eq!(unique.len(), domains.len());
    }
}

#[test]
fn test_youtube_resolves_to_thirteen_domains() {
    let catalog = DomainCatalog::with_builtins();
    let domains = catalog.resolve(&["YouTube".to_string()]).unwrap();
    assert_eq!(domains.len(), 13);
    assert_eq!(domains[0], "youtube.com");
}

#[test]
fn test_resolve_orders_by_group_name() {
    let catalog = DomainCatalog::with_builtins();
    let domains = catalog
        .resolve(&["YouTube".to_string(), "TikTok".to_string()])
        .unwrap();
    assert_eq!(domains[0], "tiktok.com");
    assert_eq!(domains.len(), 20);
}
