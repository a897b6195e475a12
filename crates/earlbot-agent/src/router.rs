//! Command router — maps raw message text to a command and a reply visibility.
//!
//! Stateless. A leading `!` asks for a private reply and is stripped before
//! matching. Matching is exact after trimming and lowercasing; there is no
//! prefix matching, so `"$earlgpt hello"` is not a command.

use earlbot_core::bus::Visibility;

/// Private-reply marker.
pub const PRIVATE_MARKER: char = '!';

/// What the bot should do with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `$earlgpt` — single-shot chat with memory.
    DirectChat,
    /// `$plug` — tool-using planner.
    ToolPlan,
    /// `lora` — canned greeting.
    StaticGreeting,
    /// `help` — command list.
    Help,
    /// `$reset` — clear this conversation's memory.
    Reset,
    /// Anything else; the bot stays silent.
    Unrecognized,
}

const COMMANDS: &[(&str, Command)] = &[
    ("$earlgpt", Command::DirectChat),
    ("$plug", Command::ToolPlan),
    ("lora", Command::StaticGreeting),
    ("help", Command::Help),
    ("$reset", Command::Reset),
];

/// A routed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routed {
    pub command: Command,
    pub visibility: Visibility,
    /// Text with the marker stripped and surrounding whitespace trimmed.
    pub text: String,
}

/// Route one message.
pub fn route(raw: &str) -> Routed {
    let (visibility, rest) = match raw.strip_prefix(PRIVATE_MARKER) {
        Some(rest) => (Visibility::Private, rest),
        None => (Visibility::Broadcast, raw),
    };
    let text = rest.trim();
    let key = text.to_lowercase();

    let command = COMMANDS
        .iter()
        .find(|(token, _)| *token == key)
        .map_or(Command::Unrecognized, |&(_, command)| command);

    Routed {
        command,
        visibility,
        text: text.to_string(),
    }
}
