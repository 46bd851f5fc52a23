//! Managed block inside a hosts file.
//!
//! Only the lines between the two markers belong to curfew; everything
//! else in the file is preserved byte for byte.

pub const BLOCK_BEGIN: &str = "# >>> curfew managed block >>>";
pub const BLOCK_END: &str = "# <<< curfew managed block <<<";

/// Entries for the managed block, one `<sink> <host>` per line.
#[must_use]
pub fn render_entries(domains: &[String], sink: &str, include_www: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for domain in domains {
        let line = format!("{sink} {domain}");
        if !lines.contains(&line) {
            lines.push(line);
        }
        if include_www && !domain.starts_with("www.") {
            let www = format!("{sink} www.{domain}");
            if !lines.contains(&www) {
                lines.push(www);
            }
        }
    }
    lines
}

/// Lines of the managed block currently in `content`, or `None` when the
/// file has no (complete) block.
#[must_use]
pub fn extract_block(content: &str) -> Option<Vec<String>> {
    let mut inside = false;
    let mut lines = Vec::new();
    for line in content.lines() {
        if line.trim_end() == BLOCK_BEGIN {
            inside = true;
            lines.clear();
        } else if line.trim_end() == BLOCK_END {
            if inside {
                return Some(lines);
            }
        } else if inside {
            lines.push(line.to_string());
        }
    }
    None
}

/// Replace (or append, or remove when `entries` is empty) the managed block.
#[must_use]
pub fn splice_block(content: &str, entries: &[String]) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut inside = false;
    let mut pending: Vec<&str> = Vec::new();
    let mut replaced_at = None;
    for line in content.lines() {
        if line.trim_end() == BLOCK_BEGIN {
            inside = true;
            if replaced_at.is_none() {
                replaced_at = Some(out.len());
            }
        } else if line.trim_end() == BLOCK_END && inside {
            inside = false;
            pending.clear();
        } else if inside {
            pending.push(line);
        } else {
            out.push(line);
        }
    }
    // Unterminated block: only the marker is ours, keep what follows it.
    if inside {
        out.extend(pending);
    }

    let block: Vec<&str> = if entries.is_empty() {
        Vec::new()
    } else {
        std::iter::once(BLOCK_BEGIN)
            .chain(entries.iter().map(String::as_str))
            .chain(std::iter::once(BLOCK_END))
            .collect()
    };

    match replaced_at {
        Some(at) => {
            out.splice(at..at, block);
        }
        None => {
            if !block.is_empty() && out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push("");
            }
            out.extend(block);
        }
    }

    let mut result = out.join("\n");
    if !result.is_empty() {
        result.push('\n');
    }
    result
}
