//! `curfew apps list|add|remove`

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::helpers::Sandbox;

#[test]
fn test_apps_list_shows_builtins() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube"))
        .stdout(predicate::str::contains("13 domains"))
        .stdout(predicate::str::contains("TikTok"));
}

#[test]
fn test_apps_add_then_list_marks_custom() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "add", "homework", "Example.com", "example.org"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved Homework"));

    let list = sandbox.json(&["apps", "list"]);
    let apps = list["apps"].as_array().expect("apps array");
    let homework = apps
        .iter()
        .find(|a| a["name"] == "Homework")
        .expect("custom app listed");
    assert_eq!(homework["custom"], true);
    assert_eq!(
        homework["domains"],
        serde_json::json!(["example.com", "example.org"])
    );
    assert_eq!(apps[0]["name"], "YouTube");
    assert_eq!(apps[0]["custom"], false);
}

#[test]
fn test_apps_add_restricted_app_reapplies() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "add", "Games", "games.example"])
        .assert()
        .success();
    sandbox.cmd().args(["restrict", "games"]).assert().success();
    assert!(sandbox.read("proxy.pac").contains("games.example"));

    let resp = sandbox.json(&["apps", "add", "Games", "play.example"]);
    assert_eq!(resp["group"]["domains"], serde_json::json!(["play.example"]));
    assert_eq!(resp["reconciliation"]["phase"], "committed");
    let pac = sandbox.read("proxy.pac");
    assert!(pac.contains("play.example"));
    assert!(!pac.contains("games.example"));
}

#[test]
fn test_apps_add_invalid_domain_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "add", "Bad", "ok.example", "not a domain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid domain"));

    let list = sandbox.json(&["apps", "list"]);
    assert!(
        list["apps"]
            .as_array()
            .expect("apps array")
            .iter()
            .all(|a| a["name"] != "Bad")
    );
}

#[test]
fn test_apps_add_requires_domains() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["apps", "add", "Empty"]).assert().code(2);
}

#[test]
fn test_apps_remove_builtin_is_refused() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "remove", "YouTube"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("built in"));
}

#[test]
fn test_apps_remove_restricted_custom_app_drops_restriction() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["apps", "add", "Games", "games.example"])
        .assert()
        .success();
    sandbox.cmd().args(["restrict", "Games"]).assert().success();

    sandbox
        .cmd()
        .args(["apps", "remove", "games"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Games"));

    assert!(!sandbox.read("proxy.pac").contains("games.example"));
    let status = sandbox.json(&["status"]);
    assert_eq!(status["restricted"], serde_json::json!([]));
}

#[test]
fn test_apps_remove_unknown_fails() {
    let sandbox = Sandbox::new();
    let err = sandbox.json(&["apps", "remove", "Nope"]);
    assert_eq!(err["code"], "unknown_app");
}
