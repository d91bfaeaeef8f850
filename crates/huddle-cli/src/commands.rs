//! Command parsing for the line-oriented shell.
//!
//! This module parses input lines into structured [`Command`] values.

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show or change the display name.
    Name {
        /// New name. `None` opens name entry.
        name: Option<String>,
    },

    /// Ask the server for a new room.
    CreateRoom,

    /// Enter a room by code.
    JoinRoom {
        /// Room code.
        code: String,
    },

    /// Leave the current room.
    Leave,

    /// Remove a member from the current room.
    Kick {
        /// Connection id of the member.
        member_id: String,
    },

    /// List members of the current room.
    Members,

    /// Clear the current error banner.
    Dismiss,

    /// Show available commands.
    Help,

    /// Quit the application.
    Quit,

    /// Plain text: a chat message, or a name while entering one.
    Message {
        /// Message content.
        content: String,
    },

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a user input string into a command.
///
/// Commands start with `/`. Anything else is treated as a message.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Message { content: input.to_string() };
    };

    let mut parts = cmd_str.split_whitespace();
    let command = parts.next().unwrap_or("");
    let rest: Vec<&str> = parts.collect();

    match command {
        "name" => {
            let name = rest.join(" ");
            Command::Name { name: (!name.is_empty()).then_some(name) }
        },

        "create" => Command::CreateRoom,

        "join" => match rest.as_slice() {
            [code] => Command::JoinRoom { code: (*code).to_string() },
            _ => Command::InvalidArgs {
                command: "join".into(),
                error: "Usage: /join <room_code>".into(),
            },
        },

        "leave" => Command::Leave,

        "kick" => match rest.as_slice() {
            [member_id] => Command::Kick { member_id: (*member_id).to_string() },
            _ => Command::InvalidArgs {
                command: "kick".into(),
                error: "Usage: /kick <member_id>".into(),
            },
        },

        "members" | "who" => Command::Members,

        "dismiss" => Command::Dismiss,

        "help" | "?" => Command::Help,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

/// One line per command, for `/help`.
pub const HELP: &[&str] = &[
    "/name [name]       show or change your display name",
    "/create            create a room and enter it",
    "/join <code>       enter a room by code",
    "/leave             leave the current room",
    "/kick <member_id>  remove a member (owner only)",
    "/members           list room members",
    "/dismiss           clear the error banner",
    "/quit              exit",
];
