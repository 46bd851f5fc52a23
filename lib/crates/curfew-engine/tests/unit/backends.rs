//! Production backends against temp directories and a recording runner.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use curfew_common::Policy;
use curfew_engine::application::ports::{CommandRunner, EnforcementBackend};
use curfew_engine::domain::catalog::DomainCatalog;
use curfew_engine::domain::{
    ArtifactBody, FirewallSettings, HostsFileSettings, PacSettings, ProxyAclSettings,
};
use curfew_engine::infra::backends::{
    FirewallBackend, HostsFileBackend, PacProxyBackend, ProxyAclBackend,
};
use tempfile::TempDir;

use crate::helpers::{RecordingRunner, err_output, ok_output};

fn policy(groups: &[&str], internet_blocked: bool, revision: u64) -> Policy {
    Policy {
        restricted_groups: groups.iter().map(|g| (*g).to_string()).collect(),
        internet_blocked,
        revision,
    }
}

fn resolve(policy: &Policy) -> Vec<String> {
    DomainCatalog::with_builtins()
        .resolve(&policy.restricted_groups)
        .unwrap()
}

fn squid(dir: &Path, runner: &Arc<RecordingRunner>) -> ProxyAclBackend {
    ProxyAclBackend::new(
        ProxyAclSettings {
            acl_path: dir.join("blocked_domains.acl"),
            config_path: dir.join("squid.conf"),
            ..ProxyAclSettings::default()
        },
        Arc::clone(runner) as Arc<dyn CommandRunner>,
    )
}

// ── ProxyAcl ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_squid_youtube_acl_escapes_every_domain() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    let backend = squid(dir.path(), &runner);
    let p = policy(&["YouTube"], false, 1);

    backend.apply(&backend.render(&p, &resolve(&p))).await.unwrap();

    let acl = std::fs::read_to_string(dir.path().join("blocked_domains.acl")).unwrap();
    let lines: Vec<&str> = acl.lines().collect();
    assert_eq!(lines.len(), 13);
    assert!(lines.contains(&"youtube\\.com"));
    assert!(lines.contains(&"youtube\\.googleapis\\.com"));
    assert!(!acl.ends_with('\n'));

    let conf = std::fs::read_to_string(dir.path().join("squid.conf")).unwrap();
    assert!(conf.contains("http_access deny blocked_domains"));
    assert_eq!(runner.calls(), [["systemctl", "reload", "squid"]]);
    assert!(backend.verify().await.unwrap());
}

#[tokio::test]
async fn test_squid_internet_blocked_config_order() {
    let dir = TempDir::new().unwrap();
    let backend = squid(dir.path(), &RecordingRunner::new());
    let p = policy(&["TikTok"], true, 2);
    let artifact = backend.render(&p, &resolve(&p));
    let ArtifactBody::Files { files } = &artifact.body else {
        panic!("squid renders files");
    };
    let directives: Vec<&str> = files[1]
        .content
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .take(4)
        .collect();
    assert_eq!(directives[1], format!(
        "acl blocked_domains url_regex -i \"{}\"",
        dir.path().join("blocked_domains.acl").display()
    ));
    assert_eq!(directives[2], "acl block_all dstdomain .");
    assert_eq!(directives[3], "http_access deny block_all");
    assert!(!files[1].content.contains("deny blocked_domains"));
}

#[tokio::test]
async fn test_squid_verify_detects_out_of_band_edit() {
    let dir = TempDir::new().unwrap();
    let backend = squid(dir.path(), &RecordingRunner::new());
    assert!(!backend.verify().await.unwrap());

    let p = policy(&["TikTok"], false, 1);
    backend.apply(&backend.render(&p, &resolve(&p))).await.unwrap();
    assert!(backend.verify().await.unwrap());

    std::fs::write(dir.path().join("blocked_domains.acl"), "").unwrap();
    assert!(!backend.verify().await.unwrap());
}

#[tokio::test]
async fn test_squid_reload_auth_failure_is_permanent() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    runner.push_output(err_output(
        1,
        b"Failed to reload squid.service: Interactive authentication required.",
    ));
    let backend = squid(dir.path(), &runner);
    let p = policy(&[], true, 1);
    let err = backend.apply(&backend.render(&p, &[])).await.unwrap_err();
    assert!(err.is_permanent());
    assert!(err.message().starts_with("systemctl failed"));
}

#[tokio::test]
async fn test_squid_reload_failure_is_transient() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    runner.push_output(err_output(1, b"Job for squid.service failed."));
    let backend = squid(dir.path(), &runner);
    let p = policy(&[], false, 1);
    let err = backend.apply(&backend.render(&p, &[])).await.unwrap_err();
    assert!(!err.is_permanent());
}

// ── HostsFile ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hosts_splice_preserves_foreign_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts");
    std::fs::write(&path, "127.0.0.1 localhost\n192.168.1.10 nas\n").unwrap();
    let backend = HostsFileBackend::new(HostsFileSettings {
        path: path.clone(),
        ..HostsFileSettings::default()
    });

    let p = policy(&["TikTok"], true, 1);
    backend.apply(&backend.render(&p, &resolve(&p))).await.unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("127.0.0.1 localhost\n192.168.1.10 nas\n"));
    assert!(content.contains("0.0.0.0 tiktok.com\n0.0.0.0 www.tiktok.com\n"));
    assert!(backend.verify().await.unwrap());

    let cleared = policy(&[], true, 2);
    backend.apply(&backend.render(&cleared, &[])).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "127.0.0.1 localhost\n192.168.1.10 nas\n\n"
    );
    assert!(backend.verify().await.unwrap());
}

#[tokio::test]
async fn test_hosts_verify_detects_removed_block() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts");
    let backend = HostsFileBackend::new(HostsFileSettings {
        path: path.clone(),
        ..HostsFileSettings::default()
    });
    let p = policy(&["TikTok"], false, 1);
    backend.apply(&backend.render(&p, &resolve(&p))).await.unwrap();
    std::fs::write(&path, "127.0.0.1 localhost\n").unwrap();
    assert!(!backend.verify().await.unwrap());
}

// ── Firewall ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_firewall_loads_script_and_verifies_comments() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("curfew.nft");
    let runner = RecordingRunner::new();
    let backend = FirewallBackend::new(
        FirewallSettings {
            script_path: script_path.clone(),
            ..FirewallSettings::default()
        },
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
    );

    let domains = vec!["tiktok.com".to_string()];
    let p = policy(&["TikTok"], true, 1);
    backend.apply(&backend.render(&p, &domains)).await.unwrap();

    let script = std::fs::read_to_string(&script_path).unwrap();
    assert!(script.starts_with("table inet curfew\ndelete table inet curfew\n"));

    runner.push_output(ok_output(
        br#"table inet curfew {
	chain output {
		reject comment "curfew:block_all"
		ip daddr { 1.2.3.4 } reject comment "curfew:tiktok.com"
	}
}"#,
    ));
    assert!(backend.verify().await.unwrap());

    runner.push_output(ok_output(b"table inet curfew {\n}\n"));
    assert!(!backend.verify().await.unwrap());

    runner.push_output(err_output(1, b"Error: No such file or directory"));
    assert!(!backend.verify().await.unwrap());

    let calls = runner.calls();
    assert_eq!(calls[0], ["nft", "-f", script_path.display().to_string().as_str()]);
    assert_eq!(calls[1], ["nft", "list", "table", "inet", "curfew"]);
}

#[tokio::test]
async fn test_firewall_nft_permission_failure_is_permanent() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    runner.push_output(err_output(1, b"Error: Operation not permitted"));
    let backend = FirewallBackend::new(
        FirewallSettings {
            script_path: dir.path().join("curfew.nft"),
            ..FirewallSettings::default()
        },
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
    );
    let p = policy(&[], true, 1);
    assert!(backend.apply(&backend.render(&p, &[])).await.unwrap_err().is_permanent());
    assert!(!backend.verify().await.unwrap());
}

// ── PAC ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pac_round_trip_and_tamper() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("www").join("proxy.pac");
    let backend = PacProxyBackend::new(PacSettings {
        path: path.clone(),
        ..PacSettings::default()
    });
    let p = policy(&["TikTok"], false, 1);
    let artifact = backend.render(&p, &resolve(&p));
    backend.apply(&artifact).await.unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("dnsDomainIs(host, \".musical.ly\")"));
    assert!(backend.verify().await.unwrap());

    // Re-applying the same artifact is harmless.
    backend.apply(&artifact).await.unwrap();
    assert!(backend.verify().await.unwrap());

    std::fs::write(&path, "function FindProxyForURL(url, host) { return \"DIRECT\"; }").unwrap();
    assert!(!backend.verify().await.unwrap());
}

#[test]
fn test_render_is_deterministic_and_digest_ignores_revision() {
    let backend = PacProxyBackend::new(PacSettings::default());
    let domains = vec!["tiktok.com".to_string()];
    let a = backend.render(&policy(&["TikTok"], false, 1), &domains);
    let b = backend.render(&policy(&["TikTok"], false, 9), &domains);
    assert_eq!(a.body, b.body);
    assert_eq!(a.digest(), b.digest());
}
