//! Module `commands`
//!
//! Parses one raw control line into a `Command` and names the verbs the
//! server understands.

/// One parsed control line. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Upper-cased verb, empty when the line is invalid
    pub verb: String,
    /// Everything after the first space, without the line terminator
    pub argument: String,
    pub valid: bool,
    /// The line exactly as received
    pub request: String,
}

impl Command {
    /// Raw fragment echoed back in a `501` reply
    pub fn fragment(&self) -> &str {
        self.request.trim_end_matches(['\r', '\n'])
    }
}

/// Parse a raw line terminated by `\r\n`.
///
/// The verb ends at the first space or, for a command without argument, at
/// the `\r\n` terminator. A line whose verb would be empty, or that has
/// neither separator, is invalid.
pub fn parse_command(raw: &str) -> Command {
    let separator = raw.find(' ').or_else(|| raw.find("\r\n"));

    match separator {
        Some(index) if index > 0 => {
            let rest = &raw[index..];
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            let argument = rest
                .strip_suffix("\r\n")
                .or_else(|| rest.strip_suffix('\n'))
                .unwrap_or(rest);
            Command {
                verb: raw[..index].to_ascii_uppercase(),
                argument: argument.to_string(),
                valid: true,
                request: raw.to_string(),
            }
        }
        _ => Command {
            verb: String::new(),
            argument: String::new(),
            valid: false,
            request: raw.to_string(),
        },
    }
}

/// Verbs with a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    User,
    Pass,
    Pwd,
    Xpwd,
    Cwd,
    Type,
    Pasv,
    List,
    Retr,
    Syst,
}

impl Verb {
    /// Look a verb up by its lower-cased name.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Verb::User),
            "pass" => Some(Verb::Pass),
            "pwd" => Some(Verb::Pwd),
            "xpwd" => Some(Verb::Xpwd),
            "cwd" => Some(Verb::Cwd),
            "type" => Some(Verb::Type),
            "pasv" => Some(Verb::Pasv),
            "list" => Some(Verb::List),
            "retr" => Some(Verb::Retr),
            "syst" => Some(Verb::Syst),
            _ => None,
        }
    }

    /// Whether the verb is refused before login when login is required
    pub fn requires_login(self) -> bool {
        !matches!(self, Verb::User | Verb::Pass | Verb::Syst | Verb::Type)
    }
}
