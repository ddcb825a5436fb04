use {
    msgkit_commands::{CommandGroup, CommandRegistry, CommandSchema, ParamSpec, Result},
    msgkit_dispatch::Command,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCommand {
    Name,
    Add,
    Remove,
    Agent,
    Help,
}

impl Command for GroupCommand {
    fn from_trigger(trigger: &str) -> Option<Self> {
        match trigger {
            "/name" => Some(Self::Name),
            "/add" => Some(Self::Add),
            "/remove" => Some(Self::Remove),
            "/agent" => Some(Self::Agent),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Command groups of the group bot, in help order.
pub fn command_groups() -> Vec<CommandGroup> {
    vec![
        CommandGroup::new("Group", "Manage the group and its members.", vec![
            CommandSchema::new("/name", "Rename the group.").param(ParamSpec::text("name")),
            CommandSchema::new("/add", "Add members to the group.")
                .param(ParamSpec::mentions("users")),
            CommandSchema::new("/remove", "Remove members from the group.")
                .param(ParamSpec::mentions("users")),
        ]),
        CommandGroup::new("Agent", "Talk to the assistant.", vec![
            CommandSchema::new("/agent", "Ask the assistant anything.")
                .param(ParamSpec::text("prompt")),
        ]),
        CommandGroup::new("Help", "Get help with the bot.", vec![CommandSchema::new(
            "/help",
            "Show the available commands.",
        )]),
    ]
}

pub fn registry() -> Result<CommandRegistry> {
    CommandRegistry::new(command_groups())
}
