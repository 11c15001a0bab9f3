//! Mission catalog and objective matching

use crate::command::Command;
use crate::parse::{CommandLine, Stage};
use crate::vfs::Vfs;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Objective {
    pub text: String,
    /// Command line that satisfies this objective.
    pub command: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mission {
    pub id: u32,
    pub title: String,
    pub story: String,
    pub objectives: Vec<Objective>,
    pub hints: Vec<String>,
    /// (command fragment, description) pairs, in display order.
    pub reference: Vec<(String, String)>,
    pub xp_reward: u32,
    /// Absolute directory the player is placed in when the mission loads.
    pub start_dir: String,
    /// Home-relative paths the mission's objectives rely on.
    pub required_paths: Vec<String>,
}

impl Mission {
    fn new(id: u32, title: &str, story: &str, xp_reward: u32, home: &str) -> Self {
        Mission {
            id,
            title: title.into(),
            story: story.into(),
            objectives: Vec::new(),
            hints: Vec::new(),
            reference: Vec::new(),
            xp_reward,
            start_dir: home.into(),
            required_paths: Vec::new(),
        }
    }

    fn objective(mut self, text: &str, command: &str) -> Self {
        self.objectives.push(Objective {
            text: text.into(),
            command: command.into(),
            details: String::new(),
        });
        self
    }

    /// Hints also serve as the details of the objective at the same index.
    fn hints(mut self, hints: &[&str]) -> Self {
        self.hints = hints.iter().map(|h| h.to_string()).collect();
        for (obj, hint) in self.objectives.iter_mut().zip(hints) {
            obj.details = hint.to_string();
        }
        self
    }

    fn reference(mut self, pairs: &[(&str, &str)]) -> Self {
        self.reference = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    fn start_in(mut self, dir: String) -> Self {
        self.start_dir = dir;
        self
    }

    fn requires(mut self, paths: &[&str]) -> Self {
        self.required_paths = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Hint for objective `index`, or the last hint past the end.
    pub fn hint(&self, index: usize) -> Option<&str> {
        self.hints
            .get(index)
            .or_else(|| self.hints.last())
            .map(String::as_str)
    }
}

/// All missions, in play order. `home` is used for start directories and
/// absolute paths in objectives.
pub fn catalog(home: &str) -> Vec<Mission> {
    vec![
        Mission::new(1, "Mission 1: First Day", "Welcome to TechCorp! You've just been hired as a junior sysadmin. Your first task is to familiarize yourself with the terminal. Let's start with the basics - listing files.", 100, home)
            .objective("Type 'ls' to list files", "ls")
            .objective("Type 'pwd' to see your current location", "pwd")
            .hints(&[
                "The 'ls' command stands for \"list\". It shows you what files and folders are in your current location.",
                "The 'pwd' command means \"print working directory\". It tells you exactly where you are in the filesystem.",
            ])
            .reference(&[("ls", "List directory contents"), ("pwd", "Print working directory"), ("cd", "Change directory")]),
        Mission::new(2, "Mission 2: Exploration", "Great job! Your manager is impressed. Now she wants you to explore the filesystem. There's a directory called \"documents\" that you need to investigate.", 150, home)
            .objective("Change to the documents directory", "cd documents")
            .objective("List the files in documents", "ls")
            .objective("Go back to home directory", "cd ..")
            .hints(&[
                "Use 'cd documents' to change into the documents directory.",
                "After moving to a directory, use 'ls' to see what's inside.",
                "The .. notation means \"parent directory\". Use 'cd ..' to go back.",
            ])
            .reference(&[("cd", "Change directory (cd <directory>)"), ("cd ..", "Go to parent directory"), ("cd ~", "Go to home directory"), ("ls", "List files")])
            .requires(&["documents"]),
        Mission::new(3, "Mission 3: File Creation", "A developer needs you to create some files for a new project. Time to learn file manipulation!", 200, home)
            .objective("Create a file called README.md", "touch README.md")
            .objective("Create a directory called src", "mkdir src")
            .objective("Verify your files were created", "ls")
            .hints(&[
                "Use 'touch <filename>' to create a new empty file.",
                "Use 'mkdir <dirname>' to create a new directory (folder).",
                "Always verify your work with 'ls'!",
            ])
            .reference(&[("touch", "Create an empty file"), ("mkdir", "Make directory (create folder)"), ("ls", "List files to verify")]),
        Mission::new(4, "Mission 4: Reading Files", "Someone left an important note in a file. You need to read it without opening a text editor.", 150, home)
            .objective("Read the contents of message.txt", "cat message.txt")
            .hints(&[
                "The 'cat' command displays file contents. Use 'cat message.txt'.",
                "cat stands for \"concatenate\" but is commonly used to display files.",
            ])
            .reference(&[("cat", "Display file contents"), ("head", "Show first lines of file"), ("tail", "Show last lines of file")])
            .requires(&["message.txt"]),
        Mission::new(5, "Mission 5: File Operations", "Files need to be organized. Practice copying, moving, and removing files.", 250, home)
            .objective("Copy test.txt to backup.txt", "cp test.txt backup.txt")
            .objective("Rename old.txt to new.txt", "mv old.txt new.txt")
            .objective("Delete the file junk.txt", "rm junk.txt")
            .hints(&[
                "Use 'cp source destination' to copy files.",
                "Use 'mv old new' to rename (move) files.",
                "Use 'rm filename' to delete files. Be careful - there's no undo!",
            ])
            .reference(&[("cp", "Copy files (cp source dest)"), ("mv", "Move/rename files (mv old new)"), ("rm", "Remove files (CAREFUL!)"), ("rm -r", "Remove directories recursively")])
            .requires(&["test.txt", "old.txt", "junk.txt"]),
        Mission::new(6, "Mission 6: Search and Discover", "The server logs are filling up with errors. Your manager needs you to find all ERROR messages in the log files. Time to learn grep - the search master!", 300, home)
            .objective("Go to the logs directory: cd logs", "cd logs")
            .objective("Search for ERROR in server.log: grep ERROR server.log", "grep ERROR server.log")
            .objective("Search for User in access.log: grep User access.log", "grep User access.log")
            .hints(&[
                "Type exactly: cd logs",
                "Then type: grep ERROR server.log",
                "grep searches for text patterns in files. Format: grep PATTERN filename",
            ])
            .reference(&[("grep", "Search for patterns in files"), ("grep -i", "Case-insensitive search"), ("grep -n", "Show line numbers"), ("grep -c", "Count matching lines")])
            .requires(&["logs"]),
        Mission::new(7, "Mission 7: File Viewing", "The data.txt file is huge! You don't need to see all of it - just the beginning and end. Learn to peek at files efficiently.", 250, home)
            .objective("Go back to home directory: cd ~", "cd ~")
            .objective("View first 3 lines: head -n 3 data.txt", "head -n 3 data.txt")
            .objective("View last 3 lines: tail -n 3 data.txt", "tail -n 3 data.txt")
            .hints(&[
                "Use 'cd ~' or 'cd' to return home.",
                "head shows the top of a file: head -n 3 filename",
                "tail shows the bottom of a file: tail -n 3 filename",
            ])
            .reference(&[("head", "View start of file"), ("head -n", "Specify number of lines"), ("tail", "View end of file"), ("tail -n", "Specify number of lines")])
            .start_in(format!("{}/logs", home))
            .requires(&["logs", "data.txt"]),
        Mission::new(8, "Mission 8: Power Search", "Your team needs a list of all developers. The users.txt file contains user roles, but you need to filter it. Time to master grep!", 300, home)
            .objective("Find all developers: grep developer users.txt", "grep developer users.txt")
            .objective("Search for port: grep port config.txt", "grep port config.txt")
            .hints(&[
                "grep searches for text patterns in files.",
                "grep developer users.txt will find lines containing \"developer\".",
                "Try grep port config.txt to find port settings.",
            ])
            .reference(&[("grep", "Search text in files"), ("grep word file", "Find \"word\" in file"), ("grep -v", "Show lines NOT matching"), ("grep -i", "Ignore case")])
            .requires(&["users.txt", "config.txt"]),
        Mission::new(9, "Mission 9: Finding Files", "There are files scattered everywhere! You need to locate specific files by name. The find command is your new best friend.", 350, home)
            .objective("Find all .txt files: find . -name \"*.txt\"", "find . -name \"*.txt\"")
            .objective("Find config.txt: find . -name config.txt", "find . -name config.txt")
            .hints(&[
                "find searches for files by name or pattern.",
                "Use: find . -name \"*.txt\" to find all .txt files",
                "The dot (.) means \"current directory and below\".",
            ])
            .reference(&[("find", "Search for files"), ("find . -name", "Find by name pattern"), ("find . -type f", "Find only files"), ("find . -type d", "Find only directories")])
            .requires(&["config.txt"]),
        Mission::new(10, "Mission 10: Pipes - The Power Combo", "Real power comes from combining commands! Use pipes (|) to chain commands together. Your manager wants a count of the errors in the logs.", 400, home)
            .objective("Count ERROR lines: grep ERROR logs/server.log | wc -l", "grep ERROR logs/server.log | wc -l")
            .objective("List first 5 .txt files: find . -name \"*.txt\" | head -n 5", "find . -name \"*.txt\" | head -n 5")
            .hints(&[
                "The pipe | sends output from one command to another.",
                "grep ERROR file | wc -l counts matching lines.",
                "find can be piped to head to limit results.",
            ])
            .reference(&[("|", "Pipe: send output to another command"), ("wc -l", "Count lines"), ("wc -w", "Count words"), ("command1 | command2", "Chain commands")])
            .requires(&["logs"]),
        Mission::new(11, "Mission 11: Output Redirection", "Instead of displaying results on screen, save them to files! Learn to redirect output - a crucial skill for automation.", 350, home)
            .objective("Save ls output: ls > filelist.txt", "ls > filelist.txt")
            .objective("View the file: cat filelist.txt", "cat filelist.txt")
            .objective("Append text: echo \"admin\" >> info.txt", "echo \"admin\" >> info.txt")
            .hints(&[
                "Use > to redirect output to a file (overwrites).",
                "Use >> to append to a file (adds to end).",
                "Example: ls > output.txt saves the list to a file.",
            ])
            .reference(&[(">", "Redirect output (overwrite)"), (">>", "Redirect output (append)"), ("echo", "Print text"), ("command > file", "Save output to file")]),
        Mission::new(12, "Mission 12: Wildcards", "Working with multiple files at once is essential. Master wildcards to match file patterns like a pro!", 300, home)
            .objective("List all .txt files: ls *.txt", "ls *.txt")
            .objective("Create backup and copy files: mkdir backup && cp *.txt backup/", "mkdir backup && cp *.txt backup/")
            .hints(&[
                "The asterisk * matches any characters.",
                "*.txt matches all files ending in .txt",
                "You can use wildcards with most commands: ls *.txt, rm *.log, etc.",
            ])
            .reference(&[("*", "Match any characters"), ("*.txt", "All files ending in .txt"), ("file*", "Files starting with \"file\"")]),
        Mission::new(13, "Mission 13: Working Directory Mastery", "Navigate complex directory structures like a ninja! Time to explore nested folders and master absolute vs relative paths.", 350, home)
            .objective("Navigate to nested dir: cd projects/website", "cd projects/website")
            .objective("List files: ls", "ls")
            .objective("Jump to home: cd ~", "cd ~")
            .objective(
                &format!("Use absolute path: cd {}/logs", home),
                &format!("cd {}/logs", home),
            )
            .hints(&[
                "You can navigate multiple levels: cd projects/website",
                "Absolute paths start with /: /home/user/logs",
                "Relative paths are from current location: ../documents",
                "Use ~ to mean home directory: cd ~/projects",
            ])
            .reference(&[("cd path/to/dir", "Navigate multiple levels"), ("cd /absolute/path", "Use absolute path"), ("cd ../..", "Go up two levels"), ("cd ~", "Jump to home")])
            .requires(&["logs", "projects/website"]),
        Mission::new(14, "Mission 14: Combining Skills", "A critical incident! The server is acting up. Use all your skills to investigate logs, find errors, and create a report.", 500, home)
            .objective("Find all ERRORs: grep ERROR logs/*.log", "grep ERROR logs/*.log")
            .objective("Save count: grep ERROR logs/*.log | wc -l > report.txt", "grep ERROR logs/*.log | wc -l > report.txt")
            .objective("View report: cat report.txt", "cat report.txt")
            .hints(&[
                "Use wildcards to search multiple files: logs/*.log",
                "Combine grep, pipes, wc, and redirection!",
                "Remember: grep finds patterns, wc counts, > saves to file.",
            ])
            .reference(&[("grep pattern files", "Search multiple files"), ("*.log", "All .log files"), ("|", "Pipe to another command"), (">", "Save output to file")])
            .requires(&["logs"]),
        Mission::new(15, "Mission 15: The Final Challenge", "Congratulations on making it this far! Your final test: complete a complex real-world task using everything you've learned. The company needs a complete audit.", 1000, home)
            .objective("Create audit directory: mkdir audit", "mkdir audit")
            .objective("List all .txt files: find . -name \"*.txt\" > audit/all_txt_files.txt", "find . -name \"*.txt\" > audit/all_txt_files.txt")
            .objective("Copy log files: cp logs/*.log audit/", "cp logs/*.log audit/")
            .objective("Count entries: cat logs/*.log | wc -l > audit/total_entries.txt", "cat logs/*.log | wc -l > audit/total_entries.txt")
            .objective("Verify: ls audit", "ls audit")
            .hints(&[
                "Take it step by step - one objective at a time.",
                "Use find with > to save file lists.",
                "Use cp with wildcards to copy multiple files.",
                "Use cat with wildcards to combine files, then pipe to wc.",
            ])
            .reference(&[("mkdir", "Create directories"), ("find", "Search for files"), ("cp", "Copy files"), ("*.log", "All log files"), ("cat files | wc -l", "Count total lines")])
            .requires(&["logs"]),
    ]
}

fn normalize_stage(stage: &Stage, fs: &Vfs) -> Stage {
    let mut args = stage.args.clone();
    for arg in &mut args {
        if arg.len() > 1 && arg.ends_with('/') {
            arg.pop();
        }
    }
    if stage.verb == "cd" {
        let target = args.first().map(String::as_str).unwrap_or("~");
        if let Ok(abs) = fs.normalize(target) {
            args = vec![abs];
        }
    }
    Stage {
        verb: stage.verb.clone(),
        args,
    }
}

/// Canonical form used to compare a typed line with an objective. `cd`
/// targets are resolved against the current directory.
pub fn normalize(line: &CommandLine, fs: &Vfs) -> CommandLine {
    let mut out = line.clone();
    for pipeline in &mut out.chain {
        for stage in &mut pipeline.stages {
            *stage = normalize_stage(stage, fs);
        }
        if let Some(r) = &mut pipeline.redirect {
            if r.target.len() > 1 && r.target.ends_with('/') {
                r.target.pop();
            }
        }
    }
    out
}

/// Whether `line` satisfies the objective command `expected`. Beyond an
/// exact match of the normalized forms, a simple command may carry extra
/// trailing arguments (`ls -l` satisfies `ls`).
pub fn matches_objective(line: &CommandLine, expected: &str, fs: &Vfs) -> bool {
    let Ok(expected) = CommandLine::parse(expected) else {
        return false;
    };
    let typed = normalize(line, fs);
    let expected = normalize(&expected, fs);
    if typed == expected {
        return true;
    }
    match (typed.chain.as_slice(), expected.chain.as_slice()) {
        ([a], [b]) => match (a.as_simple(), b.as_simple()) {
            (Some(a), Some(b)) => a.verb == b.verb && a.args.starts_with(&b.args),
            _ => false,
        },
        _ => false,
    }
}

/// Lines made only of navigation and inspection verbs, with no redirection.
/// These run at any point of a mission without counting toward it.
pub fn is_free_roaming(line: &CommandLine) -> bool {
    !line.is_empty()
        && line.chain.iter().all(|p| p.redirect.is_none())
        && line
            .verbs()
            .all(|v| Command::from_verb(v).is_some_and(Command::is_free_roaming))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HOME;

    fn parse(s: &str) -> CommandLine {
        CommandLine::parse(s).unwrap()
    }

    #[test]
    fn test_catalog_shape() {
        let missions = catalog(DEFAULT_HOME);
        assert_eq!(missions.len(), 15);
        let rewards: Vec<u32> = missions.iter().map(|m| m.xp_reward).collect();
        assert_eq!(
            rewards,
            vec![100, 150, 200, 150, 250, 300, 250, 300, 350, 400, 350, 300, 350, 500, 1000]
        );
        assert_eq!(missions[6].start_dir, "/home/user/logs");
        assert_eq!(missions[0].start_dir, "/home/user");
        assert_eq!(missions[12].objectives[3].command, "cd /home/user/logs");
        assert!(missions[12].required_paths.contains(&"projects/website".to_string()));
        assert!(missions.iter().all(|m| !m.objectives.is_empty()));
    }

    #[test]
    fn test_catalog_objectives_parse() {
        for m in catalog(DEFAULT_HOME) {
            for o in &m.objectives {
                assert!(CommandLine::parse(&o.command).is_ok(), "{}", o.command);
            }
        }
    }

    #[test]
    fn test_hint_falls_back_to_last() {
        let m = &catalog(DEFAULT_HOME)[3];
        assert_eq!(
            m.hint(0),
            Some("The 'cat' command displays file contents. Use 'cat message.txt'.")
        );
        assert_eq!(m.hint(9), m.hints.last().map(String::as_str));
    }

    #[test]
    fn test_match_ignores_quoting_and_spacing() {
        let fs = Vfs::new();
        assert!(matches_objective(&parse("find  .  -name '*.txt'"), "find . -name \"*.txt\"", &fs));
        assert!(
            matches_objective(&parse("echo admin>>info.txt"), "echo \"admin\" >> info.txt", &fs)
        );
        assert!(!matches_objective(&parse("find . -name '*.log'"), "find . -name \"*.txt\"", &fs));
    }

    #[test]
    fn test_match_trailing_slash() {
        let fs = Vfs::new();
        assert!(matches_objective(&parse("ls audit/"), "ls audit", &fs));
        assert!(matches_objective(&parse("cp logs/*.log audit"), "cp logs/*.log audit/", &fs));
    }

    #[test]
    fn test_match_cd_by_resolved_target() {
        let mut fs = Vfs::new();
        fs.cd("documents").unwrap();
        assert!(matches_objective(&parse("cd ~"), "cd ..", &fs));
        assert!(matches_objective(&parse("cd"), "cd ..", &fs));
        assert!(matches_objective(&parse("cd /home/user"), "cd ..", &fs));
        assert!(!matches_objective(&parse("cd ../logs"), "cd ..", &fs));
    }

    #[test]
    fn test_match_extra_arguments() {
        let fs = Vfs::new();
        assert!(matches_objective(&parse("ls -l"), "ls", &fs));
        assert!(!matches_objective(&parse("pwd"), "ls", &fs));
        assert!(!matches_objective(&parse("ls | wc -l"), "ls", &fs));
        assert!(!matches_objective(&parse("ls > x.txt"), "ls", &fs));
    }

    #[test]
    fn test_free_roaming() {
        assert!(is_free_roaming(&parse("ls documents")));
        assert!(is_free_roaming(&parse("cd logs && ls")));
        assert!(is_free_roaming(&parse("man grep")));
        assert!(!is_free_roaming(&parse("ls > files.txt")));
        assert!(!is_free_roaming(&parse("cat message.txt")));
        assert!(!is_free_roaming(&parse("ls | grep txt")));
    }
}
