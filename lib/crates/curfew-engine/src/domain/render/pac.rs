//! Proxy auto-config (`FindProxyForURL`) generation.

/// Render the PAC script. Blocked hosts go to `blackhole`, everything else
/// is `DIRECT`.
#[must_use]
pub fn render(domains: &[String], internet_blocked: bool, blackhole: &str) -> String {
    let mut out = String::from("function FindProxyForURL(url, host) {\n");
    if internet_blocked {
        out.push_str(&format!("  return \"PROXY {blackhole}\";\n"));
        out.push_str("}\n");
        return out;
    }
    let mut seen: Vec<&str> = Vec::new();
    for domain in domains {
        if seen.contains(&domain.as_str()) {
            continue;
        }
        seen.push(domain);
        out.push_str(&format!(
            "  if (host == \"{domain}\" || dnsDomainIs(host, \".{domain}\")) return \"PROXY {blackhole}\";\n"
        ));
    }
    out.push_str("  return \"DIRECT\";\n");
    out.push_str("}\n");
    out
}
