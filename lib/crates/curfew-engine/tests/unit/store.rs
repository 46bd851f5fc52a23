//! Policy store: idempotence, validation, atomic persistence.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::Ordering;

use curfew_engine::application::ports::PolicyRepository;
use curfew_engine::application::{PolicyStore, StoreError};
use curfew_engine::domain::CatalogError;

use crate::helpers::InMemoryRepository;

async fn open(repo: &Arc<InMemoryRepository>) -> PolicyStore {
    PolicyStore::open(Arc::clone(repo) as Arc<dyn PolicyRepository>)
        .await
        .expect("open store")
}

fn domains(list: &[&str]) -> Vec<String> {
    list.iter().map(|d| (*d).to_string()).collect()
}

#[tokio::test]
async fn test_initial_policy_is_empty() {
    let store = open(&InMemoryRepository::new()).await;
    let policy = store.get().await;
    assert!(policy.is_default());
    assert_eq!(policy.revision, 0);
    assert_eq!(store.list_available().await, ["YouTube", "TikTok"]);
}

#[tokio::test]
async fn test_set_restriction_is_idempotent() {
    let repo = InMemoryRepository::new();
    let store = open(&repo).await;
    let first = store.set_restriction("YouTube", true).await.unwrap();
    let second = store.set_restriction("youtube", true).await.unwrap();
    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(second.policy.revision, 1);
    assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_set_internet_blocked_is_idempotent() {
    let store = open(&InMemoryRepository::new()).await;
    assert!(store.set_internet_blocked(true).await.unwrap().changed);
    assert!(!store.set_internet_blocked(true).await.unwrap().changed);
    assert!(store.set_internet_blocked(false).await.unwrap().changed);
    assert_eq!(store.get().await.revision, 2);
}

#[tokio::test]
async fn test_unknown_app_is_rejected_without_change() {
    let repo = InMemoryRepository::new();
    let store = open(&repo).await;
    let err = store.set_restriction("Snapchat", true).await.unwrap_err();
    assert!(matches!(err, StoreError::Catalog(CatalogError::UnknownGroup(ref n)) if n == "Snapchat"));
    assert_eq!(store.get().await.revision, 0);
    assert!(repo.stored().is_none());
}

#[tokio::test]
async fn test_failed_save_leaves_memory_unchanged() {
    let repo = InMemoryRepository::new();
    let store = open(&repo).await;
    repo.fail_saves.store(true, Ordering::SeqCst);

    let err = store.set_restriction("TikTok", true).await.unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)));
    assert!(store.get().await.restricted_groups.is_empty());

    assert!(store.add_group("Reddit", &domains(&["reddit.com"])).await.is_err());
    assert!(!store.list_available().await.contains(&"Reddit".to_string()));
}

#[tokio::test]
async fn test_replace_validates_every_name_first() {
    let store = open(&InMemoryRepository::new()).await;
    let err = store
        .replace(&domains(&["YouTube", "Nope"]), true)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Catalog(CatalogError::UnknownGroup(_))));
    assert!(store.get().await.is_default());

    let m = store.replace(&domains(&["tiktok", "YOUTUBE"]), true).await.unwrap();
    assert!(m.changed);
    assert_eq!(
        m.policy.restricted_groups.iter().collect::<Vec<_>>(),
        ["TikTok", "YouTube"]
    );
    assert!(!store.replace(&domains(&["TikTok", "YouTube"]), true).await.unwrap().changed);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let store = open(&InMemoryRepository::new()).await;
    assert!(!store.reset().await.unwrap().changed);
    store.set_restriction("TikTok", true).await.unwrap();
    store.set_internet_blocked(true).await.unwrap();
    let m = store.reset().await.unwrap();
    assert!(m.changed);
    assert!(m.policy.is_default());
    assert_eq!(m.policy.revision, 3);
    assert!(!store.reset().await.unwrap().changed);
}

#[tokio::test]
async fn test_add_group_then_resolve_returns_normalized_domains() {
    let store = open(&InMemoryRepository::new()).await;
    let change = store
        .add_group("  whatsAPP ", &domains(&["WhatsApp.com", " web.whatsapp.com", "whatsapp.com"]))
        .await
        .unwrap();
    assert_eq!(change.group.name, "Whatsapp");
    assert!(!change.restricted);

    let (_, catalog) = store.snapshot().await;
    let resolved = catalog.resolve(&["Whatsapp".to_string()]).unwrap();
    assert_eq!(resolved, ["whatsapp.com", "web.whatsapp.com"]);
}

#[tokio::test]
async fn test_one_invalid_domain_rejects_whole_group() {
    let store = open(&InMemoryRepository::new()).await;
    let err = store
        .add_group(
            "Games",
            &domains(&["a.com", "b.com", "bad domain.com", "c.com", "d.com"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Catalog(CatalogError::InvalidDomain(ref d)) if d == "bad domain.com"));
    assert_eq!(store.list_available().await, ["YouTube", "TikTok"]);
}

#[tokio::test]
async fn test_custom_groups_survive_reopen() {
    let repo = InMemoryRepository::new();
    {
        let store = open(&repo).await;
        store.add_group("Reddit", &domains(&["reddit.com"])).await.unwrap();
        store.set_restriction("reddit", true).await.unwrap();
    }
    let store = open(&repo).await;
    assert_eq!(store.list_available().await, ["YouTube", "TikTok", "Reddit"]);
    assert!(store.get().await.is_restricted("Reddit"));
    assert_eq!(store.custom_groups().await.len(), 1);
}

#[tokio::test]
async fn test_builtin_cannot_be_removed() {
    let store = open(&InMemoryRepository::new()).await;
    let err = store.remove_group("youtube").await.unwrap_err();
    assert!(matches!(err, StoreError::Catalog(CatalogError::BuiltinGroup(_))));
    let err = store.remove_group("Reddit").await.unwrap_err();
    assert!(matches!(err, StoreError::Catalog(CatalogError::UnknownGroup(_))));
}

#[tokio::test]
async fn test_overriding_restricted_builtin_reports_restricted() {
    let store = open(&InMemoryRepository::new()).await;
    store.set_restriction("TikTok", true).await.unwrap();
    let change = store
        .add_group("tiktok", &domains(&["tiktok.com"]))
        .await
        .unwrap();
    assert_eq!(change.group.name, "TikTok");
    assert!(change.restricted);

    let removed = store.remove_group("TikTok").await.unwrap();
    assert_eq!(removed.group.domains, ["tiktok.com"]);
    let (_, catalog) = store.snapshot().await;
    assert_eq!(catalog.get("TikTok").unwrap().domains.len(), 7);
}

#[tokio::test]
async fn test_prune_only_removes_names_missing_from_catalog() {
    let store = open(&InMemoryRepository::new()).await;
    store.set_restriction("TikTok", true).await.unwrap();
    let m = store.prune_groups(&["TikTok".to_string()]).await.unwrap();
    assert!(!m.changed);
    assert!(m.policy.is_restricted("TikTok"));
}
