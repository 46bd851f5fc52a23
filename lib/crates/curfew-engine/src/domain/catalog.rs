//! Domain catalog: app/site name → domains.
//!
//! Pure data structure. Locking and persistence live in
//! `application::store`; this type only validates, normalizes and looks up.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use curfew_common::DomainGroup;
use regex::Regex;

use crate::domain::error::CatalogError;

/// Accepted domain shape: a label, a dot, then labels and dots.
pub static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9-]+\.[A-Za-z0-9-.]+$").expect("valid regex")
});

/// Groups shipped with the engine, in display order.
pub const BUILTIN_GROUPS: &[(&str, &[&str])] = &[
    (
        "YouTube",
        &[
            "youtube.com",
            "googlevideo.com",
            "ytimg.com",
            "youtu.be",
            "youtube-nocookie.com",
            "youtube.googleapis.com",
            "yt.be",
            "youtubekids.com",
            "youtubeeducation.com",
            "ggpht.com",
            "ytstatic.com",
            "youtubei.googleapis.com",
            "yt.googleapis.com",
        ],
    ),
    (
        "TikTok",
        &[
            "tiktok.com",
            "tiktokcdn.com",
            "musical.ly",
            "bytecdn.com",
            "tiktokv.com",
            "ttlivecdn.com",
            "tiktokcdn-us.com",
        ],
    ),
];

/// Normalize a user-supplied app name: trim, upper-case the first
/// character, lower-case the rest (`"whatsAPP"` → `"Whatsapp"`).
///
/// # Errors
///
/// Returns `InvalidName` for names that are empty after trimming.
pub fn normalize_name(raw: &str) -> Result<String, CatalogError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return Err(CatalogError::InvalidName(raw.to_string()));
    };
    if trimmed.chars().any(char::is_control) || trimmed.contains('/') {
        return Err(CatalogError::InvalidName(raw.to_string()));
    }
    let mut name: String = first.to_uppercase().collect();
    name.push_str(&chars.as_str().to_lowercase());
    Ok(name)
}

/// Validate and normalize a domain list. Fails on the first invalid entry.
///
/// # Errors
///
/// Returns `InvalidDomain` naming the first entry that does not match
/// [`DOMAIN_RE`], or `EmptyGroup` when the list is empty.
pub fn normalize_domains(group: &str, domains: &[String]) -> Result<Vec<String>, CatalogError> {
    if domains.is_empty() {
        return Err(CatalogError::EmptyGroup(group.to_string()));
    }
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(domains.len());
    for raw in domains {
        let domain = raw.trim();
        if !DOMAIN_RE.is_match(domain) {
            return Err(CatalogError::InvalidDomain(raw.clone()));
        }
        let domain = domain.to_ascii_lowercase();
        if seen.insert(domain.clone()) {
            out.push(domain);
        }
    }
    Ok(out)
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone)]
struct Entry {
    group: DomainGroup,
    /// The built-in list, kept so removing an override restores it.
    builtin_domains: Option<Vec<String>>,
    /// Custom entries and overridden built-ins are persisted.
    custom: bool,
}

/// In-memory catalog. Built-ins first (declaration order), then custom
/// groups in insertion order.
#[derive(Debug, Clone)]
pub struct DomainCatalog {
    entries: Vec<Entry>,
}

impl Default for DomainCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl DomainCatalog {
    /// Catalog holding only the built-in groups.
    #[must_use]
    pub fn with_builtins() -> Self {
        let entries = BUILTIN_GROUPS
            .iter()
            .map(|(name, domains)| {
                let domains: Vec<String> = domains.iter().map(|d| (*d).to_string()).collect();
                Entry {
                    group: DomainGroup {
                        name: (*name).to_string(),
                        domains: domains.clone(),
                        builtin: true,
                    },
                    builtin_domains: Some(domains),
                    custom: false,
                }
            })
            .collect();
        Self { entries }
    }

    /// Built-ins merged with previously persisted custom groups.
    ///
    /// Persisted entries are re-validated; an invalid one is reported rather
    /// than silently loaded.
    ///
    /// # Errors
    ///
    /// Returns the first validation error among `custom`.
    pub fn with_custom(custom: &[DomainGroup]) -> Result<Self, CatalogError> {
        let mut catalog = Self::with_builtins();
        for group in custom {
            catalog.add_group(&group.name, &group.domains)?;
        }
        Ok(catalog)
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = key(name);
        self.entries.iter().position(|e| key(&e.group.name) == wanted)
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DomainGroup> {
        self.position(name).map(|i| &self.entries[i].group)
    }

    /// Canonical (display) name for a case-insensitive lookup.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGroup` when no group matches.
    pub fn canonical_name(&self, name: &str) -> Result<String, CatalogError> {
        self.get(name)
            .map(|g| g.name.clone())
            .ok_or_else(|| CatalogError::UnknownGroup(name.to_string()))
    }

    /// Union of the domains of `names`, ordered by group name then domain
    /// order, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGroup` for the first name not in the catalog.
    pub fn resolve<'a, I>(&self, names: I) -> Result<Vec<String>, CatalogError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let (domains, unknown) = self.resolve_lenient(names);
        match unknown.into_iter().next() {
            Some(name) => Err(CatalogError::UnknownGroup(name)),
            None => Ok(domains),
        }
    }

    /// Like [`resolve`](Self::resolve) but returns unknown names instead of failing.
    pub fn resolve_lenient<'a, I>(&self, names: I) -> (Vec<String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ordered: BTreeSet<&String> = names.into_iter().collect();
        let mut seen = BTreeSet::new();
        let mut domains = Vec::new();
        let mut unknown = Vec::new();
        for name in ordered {
            match self.get(name) {
                Some(group) => {
                    for domain in &group.domains {
                        if seen.insert(domain.as_str()) {
                            domains.push(domain.clone());
                        }
                    }
                }
                None => unknown.push(name.clone()),
            }
        }
        (domains, unknown)
    }

    /// Add or overwrite a group. The whole call is validated before anything
    /// changes; an existing group (built-in or custom, case-insensitive)
    /// keeps its display name and position and has its domain list replaced.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `EmptyGroup` or `InvalidDomain`.
    pub fn add_group(&mut self, name: &str, domains: &[String]) -> Result<DomainGroup, CatalogError> {
        let name = normalize_name(name)?;
        let domains = normalize_domains(&name, domains)?;
        if let Some(i) = self.position(&name) {
            let entry = &mut self.entries[i];
            entry.group.domains = domains;
            entry.custom = true;
            return Ok(entry.group.clone());
        }
        let group = DomainGroup {
            name,
            domains,
            builtin: false,
        };
        self.entries.push(Entry {
            group: group.clone(),
            builtin_domains: None,
            custom: true,
        });
        Ok(group)
    }

    /// Remove a custom group, or drop the custom override of a built-in.
    ///
    /// # Errors
    ///
    /// Returns `UnknownGroup`, or `BuiltinGroup` for a built-in that has no
    /// override.
    pub fn remove_group(&mut self, name: &str) -> Result<DomainGroup, CatalogError> {
        let i = self
            .position(name)
            .ok_or_else(|| CatalogError::UnknownGroup(name.to_string()))?;
        let entry = &mut self.entries[i];
        match entry.builtin_domains.clone() {
            Some(_) if !entry.custom => Err(CatalogError::BuiltinGroup(entry.group.name.clone())),
            Some(original) => {
                let removed = entry.group.clone();
                entry.group.domains = original;
                entry.custom = false;
                Ok(removed)
            }
            None => Ok(self.entries.remove(i).group),
        }
    }

    /// All group names, built-ins first then custom.
    #[must_use]
    pub fn list_available(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.group.name.clone()).collect()
    }

    /// Groups to persist: custom groups and overridden built-ins.
    #[must_use]
    pub fn custom_groups(&self) -> Vec<DomainGroup> {
        self.entries
            .iter()
            .filter(|e| e.custom)
            .map(|e| e.group.clone())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}
