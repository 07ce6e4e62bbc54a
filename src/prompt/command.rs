//! Parsing of interactive input lines into commands.

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/connect <address>`
    Connect(String),
    /// `/disconnect <peer>`
    Disconnect(String),
    /// `/recievers [<peer> ...]`; an empty list clears the receivers.
    SetReceivers(Vec<String>),
    /// `/peers`
    Peers,
    /// `/help`
    Help,
    /// `/exit`
    Exit,
    /// Anything else: a chat line for the current receivers.
    Message(String),
    /// Blank input.
    Empty,
}

/// A recognized command with missing or extra arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("usage: {0}")]
pub struct UsageError(pub &'static str);

/// Receiver command keywords. The first is the historical spelling.
pub const RECEIVER_COMMANDS: [&str; 2] = ["/recievers", "/receivers"];

pub const COMMAND_NAMES: [&str; 7] = [
    "/connect",
    "/disconnect",
    "/recievers",
    "/receivers",
    "/peers",
    "/help",
    "/exit",
];

pub const HELP_TEXT: &str = "\
/connect <host:port>       Dial a peer (\":<port>\" means this host)
/disconnect <name:port>    Close a peer session
/recievers <name:port>...  Choose who receives your messages (no args clears)
/peers                     List connected peers
/help                      Show this help
/exit                      Close all sessions and quit
<text>                     Send text to the current receivers";

pub fn parse(input: &str) -> Result<Command, UsageError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Command::Empty);
    }
    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };
    match head {
        "/connect" => match single_arg(rest) {
            Some(addr) => Ok(Command::Connect(addr.to_string())),
            None => Err(UsageError("/connect <host:port>")),
        },
        "/disconnect" => match single_arg(rest) {
            Some(name) => Ok(Command::Disconnect(name.to_string())),
            None => Err(UsageError("/disconnect <name:port>")),
        },
        h if RECEIVER_COMMANDS.contains(&h) => Ok(Command::SetReceivers(
            rest.split_whitespace().map(str::to_string).collect(),
        )),
        "/peers" if rest.is_empty() => Ok(Command::Peers),
        "/help" if rest.is_empty() => Ok(Command::Help),
        "/exit" if rest.is_empty() => Ok(Command::Exit),
        _ => Ok(Command::Message(input.to_string())),
    }
}

fn single_arg(rest: &str) -> Option<&str> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Some(arg),
        _ => None,
    }
}
