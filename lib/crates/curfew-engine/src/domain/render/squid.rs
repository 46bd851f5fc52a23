//! Squid ACL and `squid.conf` grammar.
//!
//! Squid evaluates `http_access` lines top to bottom, so section order is
//! fixed: header, blocklist ACL, block-all or deny-blocklist, allow-all,
//! localnet, logging.

use std::path::Path;

/// Escape a validated domain for a `url_regex` ACL line.
///
/// Domains are restricted to `[A-Za-z0-9-.]`, so the dot is the only regex
/// metacharacter that can appear.
#[must_use]
pub fn escape_domain(domain: &str) -> String {
    domain.replace('.', "\\.")
}

/// ACL file: one escaped pattern per line, de-duplicated, no trailing newline.
#[must_use]
pub fn render_acl(domains: &[String]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(domains.len());
    for domain in domains {
        let escaped = escape_domain(domain);
        if !lines.contains(&escaped) {
            lines.push(escaped);
        }
    }
    lines.join("\n")
}

/// Inputs of the generated `squid.conf`.
pub struct SquidConfig<'a> {
    pub http_port: &'a str,
    pub acl_path: &'a Path,
    pub access_log: &'a str,
    pub internet_blocked: bool,
    pub has_blocked_domains: bool,
}

/// Render `squid.conf`; lines joined by `\n`, no trailing newline.
#[must_use]
pub fn render_config(cfg: &SquidConfig<'_>) -> String {
    let mut lines: Vec<String> = vec![
        "# Squid configuration file".to_string(),
        format!("http_port {}", cfg.http_port),
        String::new(),
        "# Define the blocklist using url_regex".to_string(),
        format!(
            "acl blocked_domains url_regex -i \"{}\"",
            cfg.acl_path.display()
        ),
        String::new(),
    ];

    if cfg.internet_blocked {
        lines.push("# Block all traffic".to_string());
        lines.push("acl block_all dstdomain .".to_string());
        lines.push("http_access deny block_all".to_string());
        lines.push(String::new());
    } else if cfg.has_blocked_domains {
        lines.push("# Deny access to blocked domains".to_string());
        lines.push("http_access deny blocked_domains".to_string());
        lines.push(String::new());
    }

    lines.extend([
        "# Allow all other traffic".to_string(),
        "http_access allow all".to_string(),
        String::new(),
        "# Define localnet (your local machine)".to_string(),
        "acl localnet src 127.0.0.1".to_string(),
        "acl localnet src ::1".to_string(),
        String::new(),
        "# Logging".to_string(),
        format!("access_log {}", cfg.access_log),
    ]);
    lines.join("\n")
}
