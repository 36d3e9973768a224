use crate::bot::command::{Argument, COMMANDS, Command, CommandParseError};
use serenity::all::{
    CommandData, CommandDataOptionValue, CommandOptionType, CreateCommand, CreateCommandOption,
};

/// Application command definitions, one per chat verb.
pub fn definitions() -> Vec<CreateCommand> {
    COMMANDS
        .iter()
        .map(|spec| {
            let command = CreateCommand::new(spec.name).description(spec.description);
            match spec.argument {
                Some((name, kind)) => {
                    let (option_type, description) = match kind {
                        Argument::Query => (CommandOptionType::String, "Search terms or a URL"),
                        Argument::Number => (CommandOptionType::Integer, "Position in the queue"),
                    };
                    command.add_option(
                        CreateCommandOption::new(option_type, name, description).required(true),
                    )
                }
                None => command,
            }
        })
        .collect()
}

pub fn parse(data: &CommandData) -> Result<Command, CommandParseError> {
    let argument = COMMANDS
        .iter()
        .find(|spec| spec.name == data.name)
        .and_then(|spec| spec.argument)
        .and_then(|(name, _)| data.options.iter().find(|option| option.name == name))
        .and_then(|option| option_text(&option.value));

    Command::from_parts(&data.name, argument.as_deref())
}

fn option_text(value: &CommandDataOptionValue) -> Option<String> {
    match value {
        CommandDataOptionValue::String(text) => Some(text.clone()),
        CommandDataOptionValue::Integer(number) => Some(number.to_string()),
        _ => None,
    }
}
