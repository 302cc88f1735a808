//! Message formatting for CLI commands

use super::context::UiContext;
use console::style;

/// Report a completed action
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.is_interactive() {
        println!("{} {}", style("✔").green(), message);
    } else {
        println!("[OK] {}", message);
    }
}

/// Report a completed action with a dimmed detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.is_interactive() {
        println!("{} {} ({})", style("✔").green(), message, style(detail).dim());
    } else {
        println!("[OK] {} ({})", message, detail);
    }
}

/// Warn about a skipped action and how to force it
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.is_interactive() {
        eprintln!("{} {} - {}", style("!").yellow(), message, style(hint).dim());
    } else {
        eprintln!("[WARN] {} - {}", message, hint);
    }
}

pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.is_interactive() {
        eprintln!("{} {}: {}", style("✖").red(), message, style(detail).red());
    } else {
        eprintln!("[FAIL] {}: {}", message, detail);
    }
}

pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.is_interactive() {
        eprintln!("  {}", style(message).dim());
    } else {
        eprintln!("  {}", message);
    }
}

/// Label/value line, label dimmed on a terminal
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.is_interactive() {
        println!("{} {}", style(format!("{}:", key)).dim(), value);
    } else {
        println!("{}: {}", key, value);
    }
}
