use thiserror::Error;

/// Virtual filesystem errors.
///
/// `Display` yields the trailing part of a Unix diagnostic
/// (`No such file or directory`); the command layer adds the verb and path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,
    #[error("Is a directory")]
    IsADirectory,
    #[error("Not a directory")]
    NotADirectory,
    #[error("File exists")]
    AlreadyExists,
    /// Directory operand given without `-r`.
    #[error("Is a directory (use -r)")]
    RecursionRequired,
    /// Moving or copying a directory into itself.
    #[error("cannot move a directory into itself")]
    InvalidMove,
    /// The home directory cannot be removed or replaced.
    #[error("Operation not permitted")]
    Protected,
}

pub type FsResult<T> = Result<T, FsError>;

/// Errors produced while running a command line. The `Display` text is what
/// the terminal shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `cat: x: No such file or directory`
    #[error("{verb}: {path}: {source}")]
    Path {
        verb: &'static str,
        path: String,
        source: FsError,
    },
    /// `rm: cannot remove 'x': No such file or directory`
    #[error("{verb}: cannot {action} '{path}': {source}")]
    Op {
        verb: &'static str,
        action: &'static str,
        path: String,
        source: FsError,
    },
    #[error("{verb}: missing {what}\nUsage: {usage}\nExample: {example}")]
    MissingOperand {
        verb: &'static str,
        what: String,
        usage: &'static str,
        example: String,
    },
    #[error("{verb}: invalid option -- '{option}'")]
    InvalidOption { verb: &'static str, option: String },
    #[error("{verb}: invalid argument '{value}'")]
    InvalidArgument { verb: &'static str, value: String },
    #[error("Command not found: {0}. Type 'help' for available commands.")]
    UnknownCommand(String),
    #[error("No manual entry for {0}")]
    NoManualEntry(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    /// A verb that does not read text placed after a `|`.
    #[error("pipe: {0}: cannot read from a pipe")]
    Pipe(String),
}

impl CommandError {
    pub fn path(verb: &'static str, path: &str, source: FsError) -> Self {
        CommandError::Path {
            verb,
            path: path.to_string(),
            source,
        }
    }

    pub fn op(verb: &'static str, action: &'static str, path: &str, source: FsError) -> Self {
        CommandError::Op {
            verb,
            action,
            path: path.to_string(),
            source,
        }
    }
}

/// Mission engine and persistence errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Command rejected because it is not the active objective.
    #[error("That's not the command for the current objective. Check the objective list and try again.")]
    ObjectiveMismatch,
    #[error("no mission with index {0}")]
    UnknownMission(usize),
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("corrupt save data: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_message_matches_rm() {
        let e = CommandError::op("rm", "remove", "x", FsError::NotFound);
        assert_eq!(e.to_string(), "rm: cannot remove 'x': No such file or directory");
    }

    #[test]
    fn test_path_message_matches_cat() {
        let e = CommandError::path("cat", "logs", FsError::IsADirectory);
        assert_eq!(e.to_string(), "cat: logs: Is a directory");
    }

    #[test]
    fn test_unknown_command_message() {
        let e = CommandError::UnknownCommand("foo".into());
        assert!(e.to_string().starts_with("Command not found: foo."));
    }
}
