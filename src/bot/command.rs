use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Pause,
    Resume,
    Stop,
    Queue,
    PlaySkip(String),
    Skip,
    Loop,
    Select(i64),
    Help,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Not a number: {0}")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    /// Free text or a URL, the rest of the line.
    Query,
    Number,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub argument: Option<(&'static str, Argument)>,
    pub description: &'static str,
}

impl CommandSpec {
    pub fn usage(&self) -> String {
        match self.argument {
            Some((arg, _)) => format!("{} <{}>", self.name, arg),
            None => self.name.to_string(),
        }
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "play",
        argument: Some(("query", Argument::Query)),
        description: "Play a track or add it to the queue",
    },
    CommandSpec {
        name: "pause",
        argument: None,
        description: "Pause the current track",
    },
    CommandSpec {
        name: "resume",
        argument: None,
        description: "Resume the paused track",
    },
    CommandSpec {
        name: "stop",
        argument: None,
        description: "Stop playback, clear the queue and leave the channel",
    },
    CommandSpec {
        name: "queue",
        argument: None,
        description: "Show the pending queue",
    },
    CommandSpec {
        name: "playskip",
        argument: Some(("query", Argument::Query)),
        description: "Play a track right now, skipping the current one",
    },
    CommandSpec {
        name: "skip",
        argument: None,
        description: "Skip to the next track in the queue",
    },
    CommandSpec {
        name: "loop",
        argument: None,
        description: "Toggle repeating the current track",
    },
    CommandSpec {
        name: "select",
        argument: Some(("number", Argument::Number)),
        description: "Play the queue entry at the given position",
    },
    CommandSpec {
        name: "help",
        argument: None,
        description: "List the available commands",
    },
];

impl Command {
    /// Parses a chat line. Lines not starting with `prefix` are not commands
    /// and yield `None`.
    pub fn parse(line: &str, prefix: &str) -> Option<Result<Self, CommandParseError>> {
        let body = line.trim_start().strip_prefix(prefix)?;
        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        let (verb, rest) = match body.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (body, ""),
        };
        Some(Self::from_parts(verb, (!rest.is_empty()).then_some(rest)))
    }

    /// Like `parse`, but a line with an unknown verb yields `None`. The
    /// prefix front end uses this since other bots often share its prefix.
    pub fn parse_known(line: &str, prefix: &str) -> Option<Result<Self, CommandParseError>> {
        match Self::parse(line, prefix)? {
            Err(CommandParseError::Unknown(_)) => None,
            parsed => Some(parsed),
        }
    }

    pub fn from_parts(verb: &str, argument: Option<&str>) -> Result<Self, CommandParseError> {
        let verb = verb.to_lowercase();
        let argument = argument.map(str::trim).filter(|arg| !arg.is_empty());

        let query = |name: &'static str| {
            argument
                .map(str::to_string)
                .ok_or(CommandParseError::MissingArgument(name))
        };

        match verb.as_str() {
            "play" => Ok(Command::Play(query("query")?)),
            "playskip" => Ok(Command::PlaySkip(query("query")?)),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "stop" => Ok(Command::Stop),
            "queue" => Ok(Command::Queue),
            "skip" => Ok(Command::Skip),
            "loop" => Ok(Command::Loop),
            "help" => Ok(Command::Help),
            "select" => {
                let raw = argument.ok_or(CommandParseError::MissingArgument("number"))?;
                raw.parse()
                    .map(Command::Select)
                    .map_err(|_| CommandParseError::InvalidNumber(raw.to_string()))
            }
            _ => Err(CommandParseError::Unknown(verb)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Play(_) => "play",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Queue => "queue",
            Command::PlaySkip(_) => "playskip",
            Command::Skip => "skip",
            Command::Loop => "loop",
            Command::Select(_) => "select",
            Command::Help => "help",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Result<Command, CommandParseError>> {
        Command::parse(line, "!")
    }

    #[test]
    fn lines_without_prefix_are_ignored() {
        assert_eq!(parse("play something"), None);
        assert_eq!(parse("!"), None);
        assert_eq!(parse("!   "), None);
    }

    #[test]
    fn query_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse("!play  never gonna give you up "),
            Some(Ok(Command::Play("never gonna give you up".into())))
        );
        assert_eq!(
            parse("!playskip https://example.com/watch?v=1"),
            Some(Ok(Command::PlaySkip("https://example.com/watch?v=1".into())))
        );
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse("!PAUSE"), Some(Ok(Command::Pause)));
        assert_eq!(parse("!Loop"), Some(Ok(Command::Loop)));
    }

    #[test]
    fn select_needs_a_number() {
        assert_eq!(parse("!select 3"), Some(Ok(Command::Select(3))));
        assert_eq!(parse("!select -1"), Some(Ok(Command::Select(-1))));
        assert_eq!(
            parse("!select"),
            Some(Err(CommandParseError::MissingArgument("number")))
        );
        assert_eq!(
            parse("!select two"),
            Some(Err(CommandParseError::InvalidNumber("two".into())))
        );
    }

    #[test]
    fn play_without_query_is_an_error() {
        assert_eq!(
            parse("!play"),
            Some(Err(CommandParseError::MissingArgument("query")))
        );
    }

    #[test]
    fn unknown_verbs_are_reported() {
        assert_eq!(
            parse("!dance now"),
            Some(Err(CommandParseError::Unknown("dance".into())))
        );
    }

    #[test]
    fn unknown_verbs_can_be_left_for_other_bots() {
        assert_eq!(Command::parse_known("!rank", "!"), None);
        assert_eq!(Command::parse_known("!dance now", "!"), None);
        assert_eq!(Command::parse_known("!skip", "!"), Some(Ok(Command::Skip)));
        assert_eq!(
            Command::parse_known("!select two", "!"),
            Some(Err(CommandParseError::InvalidNumber("two".into())))
        );
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(Command::parse("?skip", "?"), Some(Ok(Command::Skip)));
        assert_eq!(Command::parse("!skip", "?"), None);
    }

    #[test]
    fn every_listed_command_parses() {
        for spec in COMMANDS {
            let argument = spec.argument.map(|(_, kind)| match kind {
                Argument::Query => "something",
                Argument::Number => "1",
            });
            let command = Command::from_parts(spec.name, argument).unwrap();
            assert_eq!(command.name(), spec.name);
        }
    }
}
