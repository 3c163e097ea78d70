//! Status lines for CLI commands
//!
//! Status goes to stderr so stdout carries only results (keys, ids, JSON)
//! and stays usable from scripts.

use console::style;

/// Display a section header
pub fn section(title: &str) {
    eprintln!("{}", style(title).cyan().bold());
}

/// Display a success step
pub fn step_ok(message: &str) {
    eprintln!("  {} {}", style("[OK]").green(), message);
}

/// Display a success step with detail
pub fn step_ok_detail(message: &str, detail: &str) {
    eprintln!(
        "  {} {} ({})",
        style("[OK]").green(),
        message,
        style(detail).dim()
    );
}

/// Display a warning step
pub fn step_warn(message: &str) {
    eprintln!("  {} {}", style("[WARN]").yellow(), message);
}

/// Display a warning step with hint
pub fn step_warn_hint(message: &str, hint: &str) {
    eprintln!(
        "  {} {} - {}",
        style("[WARN]").yellow(),
        message,
        style(hint).dim()
    );
}

/// Display an info step
pub fn step_info(message: &str) {
    eprintln!("  {} {}", style("[INFO]").cyan(), message);
}

/// Print key-value pair
pub fn key_value(key: &str, value: &str) {
    eprintln!("  {}: {}", style(key).dim(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_does_not_panic() {
        section("Test");
        step_ok("Step completed");
        step_ok_detail("Saved", "key-abc.cache");
        step_warn("Warning");
        step_warn_hint("Warning", "Hint");
        step_info("Info");
        key_value("Key", "value");
    }
}
