//! Display utilities for the CLI

use brb_core::{Address, Amount};
use colored::*;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

pub fn amount(value: Amount, symbol: &str) -> String {
    format!("{} {}", value, symbol)
}

/// `name (abcd1234…)` or the bare short address
pub fn identity(name: &str, address: &Address) -> String {
    if name == address.to_hex() {
        address.short()
    } else {
        format!("{} ({}…)", name, address.short())
    }
}
