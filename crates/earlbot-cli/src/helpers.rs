//! Shared CLI output helpers.

use colored::Colorize;

use earlbot_core::bus::OutboundMessage;

/// Print a bot reply, marking private ones.
pub fn print_reply(reply: &OutboundMessage) {
    println!();
    let header = "Earlbot".cyan().bold();
    if reply.is_private() {
        println!("{header} {}", "(private)".dimmed());
    } else {
        println!("{header}");
    }
    println!("{}", reply.content);
    println!();
}

/// Shown when the text was not a command.
pub fn print_no_reply() {
    println!("{}", "(no reply: not a command, try \"help\")".dimmed());
}

pub fn print_warning(text: &str) {
    eprintln!("{} {text}", "warning:".yellow().bold());
}

/// Banner shown at gateway and REPL start.
pub fn print_banner(mode: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}  {}", "Earlbot".cyan().bold(), version.dimmed(), mode.dimmed());
    println!();
}

/// Placeholder shown while waiting on the model.
pub fn print_thinking() {
    eprint!("{}", "thinking...".dimmed());
}

pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// `✓ key set` / `· not configured`.
pub fn key_status(value: &str) -> String {
    if value.trim().is_empty() {
        format!("{}", "· not configured".dimmed())
    } else {
        format!("{} (key set)", "✓".green())
    }
}
