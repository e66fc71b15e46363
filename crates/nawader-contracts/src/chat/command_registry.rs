#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "prompt",
    action: "set_analysis_prompt",
}];

pub(crate) const REASONING_COMMAND: CommandSpec = CommandSpec {
    command: "think",
    action: "set_reasoning",
};

pub(crate) const VIEW_COMMAND: CommandSpec = CommandSpec {
    command: "view",
    action: "set_view",
};

pub(crate) const ANALYZE_COMMAND: CommandSpec = CommandSpec {
    command: "analyze",
    action: "analyze",
};

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "history",
        action: "history",
    },
    CommandSpec {
        command: "exit",
        action: "exit",
    },
    CommandSpec {
        command: "quit",
        action: "exit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/think [on|off]",
    "/analyze <path> [instruction]",
    "/prompt <instruction>",
    "/view chat|image",
    "/history",
    "/help",
    "/exit",
];
