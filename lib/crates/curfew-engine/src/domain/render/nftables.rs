//! nftables script for a dedicated table.
//!
//! The script declares, deletes and re-creates the table in one
//! transaction, so `nft -f` either swaps the whole ruleset or changes
//! nothing.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::artifact::FirewallRule;

pub const COMMENT_PREFIX: &str = "curfew:";
pub const BLOCK_ALL_TAG: &str = "curfew:block_all";

#[allow(clippy::expect_used)]
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"comment "(curfew:[^"]*)""#).expect("valid regex literal")
});

/// Rules in evaluation order; block-all first so it short-circuits.
#[must_use]
pub fn render_rules(domains: &[String], internet_blocked: bool) -> Vec<FirewallRule> {
    let mut rules = Vec::new();
    if internet_blocked {
        rules.push(FirewallRule {
            comment: BLOCK_ALL_TAG.to_string(),
            expression: "reject".to_string(),
        });
    }
    for domain in domains {
        let comment = format!("{COMMENT_PREFIX}{domain}");
        if rules.iter().any(|r| r.comment == comment) {
            continue;
        }
        rules.push(FirewallRule {
            comment,
            expression: format!("ip daddr {{ {domain} }} reject"),
        });
    }
    rules
}

/// Full `nft -f` script replacing `table` (e.g. `inet curfew`).
#[must_use]
pub fn render_script(table: &str, rules: &[FirewallRule]) -> String {
    let mut out = String::new();
    out.push_str(&format!("table {table}\n"));
    out.push_str(&format!("delete table {table}\n"));
    out.push_str(&format!("table {table} {{\n"));
    out.push_str("\tchain output {\n");
    out.push_str("\t\ttype filter hook output priority 0; policy accept;\n");
    out.push_str("\t\toif \"lo\" accept\n");
    for rule in rules {
        out.push_str(&format!(
            "\t\t{} comment \"{}\"\n",
            rule.expression, rule.comment
        ));
    }
    out.push_str("\t}\n");
    out.push_str("}\n");
    out
}

/// Comment tags found in `nft list table` output.
#[must_use]
pub fn parse_comments(listing: &str) -> BTreeSet<String> {
    COMMENT_RE
        .captures_iter(listing)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
