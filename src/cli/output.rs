//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: entry names, recipients, hints
//! - Bold: headers, counts
//! - Dimmed: secondary info

use std::fmt::Display;

use console::style;

use crate::core::domain::{ImportReport, ReencryptReport};

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ saved web/github`
pub fn success(msg: &str) {
    if colors_enabled() {
        println!("{} {}", style("✓").green(), msg);
    } else {
        println!("✓ {}", msg);
    }
}

/// Print an error message to stderr (red).
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✗").red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a warning message to stderr (yellow).
pub fn warn(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("⚠").yellow(), msg);
    } else {
        eprintln!("⚠ {}", msg);
    }
}

/// Print a hint message to stderr (cyan).
///
/// Example: `→ run: cellar recipients add <id>`
pub fn hint(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}

/// Print a bold header.
pub fn header(title: &str) {
    if colors_enabled() {
        println!("{}", style(title).bold());
    } else {
        println!("{}", title);
    }
}

/// Print a key-value pair (label dimmed, value bold).
///
/// Example: `  crypto  age 1.0.0`
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        println!("  {}  {}", style(label).dim(), style(value).bold());
    } else {
        println!("  {}  {}", label, value);
    }
}

/// Print a list item with bullet.
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    if colors_enabled() {
        println!("{}", style(msg).dim());
    } else {
        println!("{}", msg);
    }
}

/// Format an entry name or recipient in cyan.
pub fn name(n: &str) -> String {
    if colors_enabled() {
        style(n).cyan().to_string()
    } else {
        n.to_string()
    }
}

/// Summarize a re-encryption batch; one warning per failed entry.
pub fn reencrypt_report(report: &ReencryptReport) {
    if report.total() == 0 {
        dimmed("no entries to re-encrypt");
        return;
    }
    success(&format!("re-encrypted {} of {} entries", report.succeeded.len(), report.total()));
    for (entry, err) in &report.failed {
        warn(&format!("{}: {}", name(entry), err));
    }
}

/// Summarize a public key import.
pub fn import_report(report: &ImportReport) {
    for id in &report.imported {
        success(&format!("imported {}", name(id)));
    }
    for id in &report.missing {
        warn(&format!("no public key for {}", name(id)));
    }
    if report.imported.is_empty() && report.missing.is_empty() {
        dimmed("all recipient keys already known");
    }
}
