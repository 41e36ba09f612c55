//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps command result output bounded and readable while preserving signal.

use colored::{ColoredString, Colorize};

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// `ALLOW` in green or `DENY` in red.
pub fn verdict(allowed: bool) -> ColoredString {
    if allowed {
        "ALLOW".bright_green().bold()
    } else {
        "DENY".bright_red().bold()
    }
}

/// `PASS`/`FAIL` marker for checklist rows.
pub fn pass_fail(pass: bool) -> ColoredString {
    if pass {
        "PASS".green()
    } else {
        "FAIL".red()
    }
}
