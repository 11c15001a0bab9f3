/// Every verb the shell understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ls,
    Pwd,
    Cd,
    Cat,
    Touch,
    Mkdir,
    Cp,
    Mv,
    Rm,
    Grep,
    Find,
    Head,
    Tail,
    Wc,
    Echo,
    Man,
    Help,
    Clear,
}

impl Command {
    pub const ALL: [Command; 18] = [
        Command::Ls,
        Command::Pwd,
        Command::Cd,
        Command::Cat,
        Command::Touch,
        Command::Mkdir,
        Command::Cp,
        Command::Mv,
        Command::Rm,
        Command::Grep,
        Command::Find,
        Command::Head,
        Command::Tail,
        Command::Wc,
        Command::Echo,
        Command::Man,
        Command::Help,
        Command::Clear,
    ];

    pub fn from_verb(verb: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.name() == verb)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Ls => "ls",
            Command::Pwd => "pwd",
            Command::Cd => "cd",
            Command::Cat => "cat",
            Command::Touch => "touch",
            Command::Mkdir => "mkdir",
            Command::Cp => "cp",
            Command::Mv => "mv",
            Command::Rm => "rm",
            Command::Grep => "grep",
            Command::Find => "find",
            Command::Head => "head",
            Command::Tail => "tail",
            Command::Wc => "wc",
            Command::Echo => "echo",
            Command::Man => "man",
            Command::Help => "help",
            Command::Clear => "clear",
        }
    }

    /// Navigation and inspection verbs that may run at any time during a
    /// mission.
    pub fn is_free_roaming(self) -> bool {
        matches!(
            self,
            Command::Cd | Command::Pwd | Command::Ls | Command::Clear | Command::Help | Command::Man
        )
    }

    /// Verbs that take the previous stage's output inside a pipe.
    pub fn reads_input(self) -> bool {
        matches!(
            self,
            Command::Cat | Command::Grep | Command::Head | Command::Tail | Command::Wc
        )
    }

    /// Verbs whose operands are paths, for tab completion.
    pub fn takes_paths(self) -> bool {
        matches!(
            self,
            Command::Ls
                | Command::Cd
                | Command::Cat
                | Command::Touch
                | Command::Mkdir
                | Command::Cp
                | Command::Mv
                | Command::Rm
                | Command::Grep
                | Command::Find
                | Command::Head
                | Command::Tail
                | Command::Wc
        )
    }

    pub fn man_page(self) -> &'static str {
        match self {
            Command::Ls => "ls - list directory contents\n\nDESCRIPTION\n  List information about files in the current directory.\n\nEXAMPLES\n  ls\n  ls *.txt\n  ls documents",
            Command::Pwd => "pwd - print working directory\n\nDESCRIPTION\n  Print the full filename of the current working directory.",
            Command::Cd => "cd - change directory\n\nDESCRIPTION\n  Change the current working directory to the specified directory.\n\nEXAMPLES\n  cd documents\n  cd ..\n  cd ~\n  cd /home/user/logs",
            Command::Cat => "cat - concatenate files and print\n\nDESCRIPTION\n  Read files sequentially, writing them to standard output.\n\nEXAMPLES\n  cat message.txt\n  cat logs/*.log",
            Command::Touch => "touch - change file timestamps\n\nDESCRIPTION\n  Update access/modification times. Creates file if it doesn't exist.",
            Command::Mkdir => "mkdir - make directories\n\nDESCRIPTION\n  Create directories if they do not already exist.",
            Command::Cp => "cp - copy files\n\nDESCRIPTION\n  Copy SOURCE to DEST, or multiple SOURCEs into DIRECTORY.\n\nOPTIONS\n  -r  Copy directories recursively",
            Command::Mv => "mv - move (rename) files\n\nDESCRIPTION\n  Rename SOURCE to DEST, or move SOURCE to DIRECTORY.",
            Command::Rm => "rm - remove files\n\nDESCRIPTION\n  Remove (unlink) files. Use with caution!\n\nOPTIONS\n  -r  Remove directories and their contents",
            Command::Grep => "grep - search for patterns\n\nDESCRIPTION\n  Search for PATTERN in each FILE.\n\nOPTIONS\n  -c  Print only a count of matching lines\n  -i  Ignore case\n  -n  Prefix each line with its line number\n  -v  Select non-matching lines\n\nEXAMPLES\n  grep ERROR log.txt\n  grep developer users.txt",
            Command::Find => "find - search for files\n\nDESCRIPTION\n  Search for files in directory hierarchy.\n\nEXAMPLES\n  find . -name \"*.txt\"\n  find . -name config.txt\n  find . -type d",
            Command::Head => "head - output first part of files\n\nDESCRIPTION\n  Print the first 10 lines of each FILE.\n\nOPTIONS\n  -n NUM  Print first NUM lines\n\nEXAMPLES\n  head data.txt\n  head -n 5 data.txt",
            Command::Tail => "tail - output last part of files\n\nDESCRIPTION\n  Print the last 10 lines of each FILE.\n\nOPTIONS\n  -n NUM  Print last NUM lines\n\nEXAMPLES\n  tail data.txt\n  tail -n 5 data.txt",
            Command::Wc => "wc - word, line, and byte count\n\nDESCRIPTION\n  Print line, word, and byte counts for each FILE.\n\nOPTIONS\n  -l  Print only line count\n  -w  Print only word count\n  -c  Print only character count\n\nEXAMPLES\n  wc data.txt\n  wc -l data.txt",
            Command::Echo => "echo - display a line of text\n\nDESCRIPTION\n  Write the arguments, separated by spaces, to standard output.",
            Command::Man => "man - an interface to the reference manuals\n\nDESCRIPTION\n  Show the manual page for a command.\n\nEXAMPLES\n  man ls",
            Command::Help => "help - list available commands\n\nDESCRIPTION\n  Show a summary of every command the terminal understands.",
            Command::Clear => "clear - clear the terminal screen",
        }
    }
}

pub const HELP_TEXT: &str = "Available Commands:
  ls          - List files in current directory
  pwd         - Print working directory
  cd <dir>    - Change directory
  cat <file>  - Display file contents
  touch <file>- Create empty file
  mkdir <dir> - Create directory
  cp <s> <d>  - Copy file
  mv <s> <d>  - Move/rename file
  rm <file>   - Remove file
  grep <p> <f>- Search for pattern in file
  find . -name- Find files by name
  head -n <f> - View first lines of file
  tail -n <f> - View last lines of file
  wc -l <f>   - Count lines in file
  echo <text> - Print text
  clear       - Clear terminal
  man <cmd>   - Show manual for command
  help        - Show this help message

Advanced:
  cmd | cmd   - Pipe output between commands
  cmd > file  - Redirect output to file
  cmd >> file - Append output to file
  cmd && cmd  - Run the second command if the first succeeds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_round_trip() {
        for c in Command::ALL {
            assert_eq!(Command::from_verb(c.name()), Some(c));
        }
        assert_eq!(Command::from_verb("vim"), None);
    }

    #[test]
    fn test_free_roaming_set() {
        let free: Vec<&str> = Command::ALL
            .iter()
            .filter(|c| c.is_free_roaming())
            .map(|c| c.name())
            .collect();
        assert_eq!(free, vec!["ls", "pwd", "cd", "man", "help", "clear"]);
    }
}
