use crate::command::{Command, HELP_TEXT};
use crate::error::{CommandError, FsError};
use crate::glob::Glob;
use crate::parse::{parse_args, CommandLine, Pipeline, Stage};
use crate::player::Achievement;
use crate::vfs::{FsNode, Vfs};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the terminal should show for one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum CommandResult {
    Output(String),
    Error(String),
    /// Wipe the displayed output.
    Clear,
}

impl CommandResult {
    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            CommandResult::Output(t) | CommandResult::Error(t) => t,
            CommandResult::Clear => "",
        }
    }
}

/// Usage counters, persisted with the save data.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandStats {
    /// Parsed input lines.
    pub total: u32,
    /// Executed stages per verb.
    pub per_verb: BTreeMap<String, u32>,
    pub successful_cd: u32,
}

impl CommandStats {
    pub fn count(&self, verb: &str) -> u32 {
        self.per_verb.get(verb).copied().unwrap_or(0)
    }
}

/// Result of `CommandProcessor::execute` plus the achievements it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub result: CommandResult,
    pub triggers: Vec<Achievement>,
}

enum Flow {
    Text(String),
    Clear,
}

impl Flow {
    fn into_text(self) -> String {
        match self {
            Flow::Text(t) => t,
            Flow::Clear => String::new(),
        }
    }
}

fn missing(
    verb: &'static str,
    what: impl Into<String>,
    usage: &'static str,
    example: impl Into<String>,
) -> CommandError {
    CommandError::MissingOperand {
        verb,
        what: what.into(),
        usage,
        example: example.into(),
    }
}

/// Runs command lines against a `Vfs`.
#[derive(Default)]
pub struct CommandProcessor {
    stats: CommandStats,
    triggers: Vec<Achievement>,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: CommandStats) -> Self {
        CommandProcessor {
            stats,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> &CommandStats {
        &self.stats
    }

    pub fn execute(&mut self, fs: &mut Vfs, line: &str) -> Execution {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Execution {
                result: CommandResult::Output(String::new()),
                triggers: Vec::new(),
            };
        }
        match CommandLine::parse(trimmed) {
            Ok(parsed) => self.run(fs, &parsed),
            Err(e) => Execution {
                result: CommandResult::Error(e.to_string()),
                triggers: Vec::new(),
            },
        }
    }

    /// Execute an already parsed line. Achievements from a pipeline that
    /// fails are dropped.
    pub fn run(&mut self, fs: &mut Vfs, line: &CommandLine) -> Execution {
        if line.is_empty() {
            return Execution {
                result: CommandResult::Output(String::new()),
                triggers: Vec::new(),
            };
        }
        self.stats.total += 1;
        if self.stats.total == 1 {
            self.triggers.push(Achievement::FirstCommand);
        }

        let mut outputs = Vec::new();
        let mut clear = false;
        let mut failure = None;
        for pipeline in &line.chain {
            let mark = self.triggers.len();
            match self.run_pipeline(fs, pipeline) {
                Ok(Flow::Text(t)) => {
                    if !t.is_empty() {
                        outputs.push(t);
                    }
                }
                Ok(Flow::Clear) => clear = true,
                Err(e) => {
                    self.triggers.truncate(mark);
                    failure = Some(e);
                    break;
                }
            }
        }
        let result = match failure {
            Some(e) => CommandResult::Error(e.to_string()),
            None if clear => CommandResult::Clear,
            None => CommandResult::Output(outputs.join("\n")),
        };
        let mut triggers = std::mem::take(&mut self.triggers);
        triggers.dedup();
        Execution { result, triggers }
    }

    fn run_pipeline(&mut self, fs: &mut Vfs, pipeline: &Pipeline) -> Result<Flow, CommandError> {
        let Some((first, rest)) = pipeline.stages.split_first() else {
            return Ok(Flow::Text(String::new()));
        };
        let mut out = self.run_stage(fs, first, None)?;
        if !rest.is_empty() {
            let mut text = out.into_text();
            for stage in rest {
                text = self.run_stage(fs, stage, Some(&text))?.into_text();
            }
            out = Flow::Text(text);
        }
        let piped = !rest.is_empty();
        let flow = match &pipeline.redirect {
            None => out,
            Some(r) => {
                let text = out.into_text();
                let written = if r.append {
                    fs.append(&r.target, &text)
                } else {
                    fs.write(&r.target, &text)
                };
                if written.map_err(|e| CommandError::path("sh", &r.target, e))? {
                    self.triggers.push(Achievement::FileCreator);
                }
                Flow::Text(String::new())
            }
        };
        if piped {
            self.triggers.push(Achievement::PipeMaster);
        }
        Ok(flow)
    }

    /// Run one stage. `input` is the previous stage's output inside a pipe;
    /// verbs that read text use it when no file operand is given.
    fn run_stage(
        &mut self,
        fs: &mut Vfs,
        stage: &Stage,
        input: Option<&str>,
    ) -> Result<Flow, CommandError> {
        *self.stats.per_verb.entry(stage.verb.clone()).or_insert(0) += 1;
        debug!("exec {} {:?}", stage.verb, stage.args);
        let args = stage.args.as_slice();
        let Some(cmd) = Command::from_verb(&stage.verb) else {
            return Err(CommandError::UnknownCommand(stage.verb.clone()));
        };
        if input.is_some() && !cmd.reads_input() {
            return Err(CommandError::Pipe(stage.verb.clone()));
        }
        let text = match cmd {
            Command::Ls => self.cmd_ls(fs, args)?,
            Command::Pwd => fs.cwd().to_string(),
            Command::Cd => self.cmd_cd(fs, args)?,
            Command::Cat => self.cmd_cat(fs, args, input)?,
            Command::Touch => self.cmd_touch(fs, args)?,
            Command::Mkdir => self.cmd_mkdir(fs, args)?,
            Command::Cp => self.cmd_cp(fs, args)?,
            Command::Mv => self.cmd_mv(fs, args)?,
            Command::Rm => self.cmd_rm(fs, args)?,
            Command::Grep => self.cmd_grep(fs, args, input)?,
            Command::Find => self.cmd_find(fs, args)?,
            Command::Head => self.cmd_head_tail(fs, "head", args, input)?,
            Command::Tail => self.cmd_head_tail(fs, "tail", args, input)?,
            Command::Wc => self.cmd_wc(fs, args, input)?,
            Command::Echo => args.join(" "),
            Command::Man => self.cmd_man(args)?,
            Command::Help => HELP_TEXT.to_string(),
            Command::Clear => return Ok(Flow::Clear),
        };
        Ok(Flow::Text(text))
    }

    /// Expand wildcards in every operand. A pattern that matches nothing is
    /// reported as missing.
    fn expand_all(
        fs: &Vfs,
        verb: &'static str,
        args: &[String],
    ) -> Result<Vec<String>, CommandError> {
        let mut out = Vec::new();
        for arg in args {
            let matched = fs.expand(arg).map_err(|e| CommandError::path(verb, arg, e))?;
            if matched.is_empty() {
                return Err(CommandError::path(verb, arg, FsError::NotFound));
            }
            out.extend(matched);
        }
        Ok(out)
    }

    fn cmd_ls(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let parsed = parse_args("ls", args, "al", "")?;
        let targets = if parsed.positional.is_empty() {
            vec![".".to_string()]
        } else {
            parsed.positional.clone()
        };
        let mut names = Vec::new();
        for target in &targets {
            if crate::glob::is_glob(target) {
                let matched = fs
                    .expand(target)
                    .map_err(|e| CommandError::op("ls", "access", target, e))?;
                if matched.is_empty() {
                    return Err(CommandError::op("ls", "access", target, FsError::NotFound));
                }
                names.extend(matched);
                continue;
            }
            match fs.resolve(target) {
                Ok(FsNode::Directory { children }) => names.extend(children.keys().cloned()),
                Ok(FsNode::File { .. }) => names.push(target.clone()),
                Err(e) => return Err(CommandError::op("ls", "access", target, e)),
            }
        }
        if self.stats.count("ls") >= 10 {
            self.triggers.push(Achievement::ListMaster);
        }
        let sep = if parsed.has('l') { "\n" } else { "  " };
        Ok(names.join(sep))
    }

    fn cmd_cd(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let target = match args {
            [] => "~",
            [one] => one.as_str(),
            _ => {
                return Err(CommandError::InvalidArgument {
                    verb: "cd",
                    value: args.join(" "),
                })
            }
        };
        fs.cd(target).map_err(|e| CommandError::path("cd", target, e))?;
        self.stats.successful_cd += 1;
        if self.stats.successful_cd >= 5 {
            self.triggers.push(Achievement::Navigator);
        }
        Ok(String::new())
    }

    fn cmd_cat(
        &mut self,
        fs: &mut Vfs,
        args: &[String],
        input: Option<&str>,
    ) -> Result<String, CommandError> {
        if args.is_empty() {
            return input.map(str::to_string).ok_or_else(|| {
                missing("cat", "file operand", "cat FILENAME", "cat message.txt")
            });
        }
        let mut parts = Vec::new();
        for path in Self::expand_all(fs, "cat", args)? {
            let content = fs.read(&path).map_err(|e| CommandError::path("cat", &path, e))?;
            parts.push(content.to_string());
        }
        Ok(parts.join("\n"))
    }

    fn cmd_touch(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        if args.is_empty() {
            return Err(missing("touch", "file operand", "touch FILENAME", "touch newfile.txt"));
        }
        for path in args {
            let created = fs
                .touch(path)
                .map_err(|e| CommandError::op("touch", "touch", path, e))?;
            if created {
                self.triggers.push(Achievement::FileCreator);
            }
        }
        Ok(String::new())
    }

    fn cmd_mkdir(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        if args.is_empty() {
            return Err(missing("mkdir", "operand", "mkdir DIRECTORY", "mkdir newfolder"));
        }
        for path in args {
            fs.mkdir(path)
                .map_err(|e| CommandError::op("mkdir", "create directory", path, e))?;
        }
        Ok(String::new())
    }

    /// Shared operand handling of `cp` and `mv`: expanded sources and the
    /// destination.
    fn sources_and_dest(
        fs: &Vfs,
        verb: &'static str,
        operands: &[String],
        example: &str,
    ) -> Result<(Vec<String>, String), CommandError> {
        let usage = if verb == "cp" { "cp SOURCE DEST" } else { "mv SOURCE DEST" };
        match operands {
            [] => Err(missing(verb, "file operand", usage, format!("{} {}", verb, example))),
            [only] => Err(missing(
                verb,
                format!("destination file operand after '{}'", only),
                usage,
                format!("{} {} {}", verb, only, example.rsplit(' ').next().unwrap_or(example)),
            )),
            [srcs @ .., dst] => {
                let mut sources = Vec::new();
                for src in srcs {
                    let matched = fs.expand(src).unwrap_or_default();
                    if matched.is_empty() {
                        return Err(CommandError::op(verb, "stat", src, FsError::NotFound));
                    }
                    sources.extend(matched);
                }
                if sources.len() > 1 && !fs.is_dir(dst) {
                    return Err(CommandError::op(verb, "copy into", dst, FsError::NotADirectory));
                }
                Ok((sources, dst.clone()))
            }
        }
    }

    fn cmd_cp(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let parsed = parse_args("cp", args, "rR", "")?;
        let recursive = parsed.has('r') || parsed.has('R');
        let (sources, dst) =
            Self::sources_and_dest(fs, "cp", &parsed.positional, "test.txt backup.txt")?;
        for src in &sources {
            fs.copy(src, &dst, recursive).map_err(|e| match e {
                FsError::NotFound if !fs.exists(src) => CommandError::op("cp", "stat", src, e),
                _ => CommandError::op("cp", "copy", src, e),
            })?;
        }
        Ok(String::new())
    }

    fn cmd_mv(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let parsed = parse_args("mv", args, "", "")?;
        let (sources, dst) =
            Self::sources_and_dest(fs, "mv", &parsed.positional, "old.txt newname.txt")?;
        for src in &sources {
            fs.rename(src, &dst).map_err(|e| match e {
                FsError::NotFound if !fs.exists(src) => CommandError::op("mv", "stat", src, e),
                _ => CommandError::op("mv", "move", src, e),
            })?;
        }
        Ok(String::new())
    }

    fn cmd_rm(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let parsed = parse_args("rm", args, "rRf", "")?;
        if parsed.positional.is_empty() {
            return Err(missing("rm", "operand", "rm FILENAME", "rm oldfile.txt"));
        }
        let recursive = parsed.has('r') || parsed.has('R');
        let force = parsed.has('f');
        for arg in &parsed.positional {
            let matched = fs.expand(arg).unwrap_or_default();
            if matched.is_empty() && !force {
                return Err(CommandError::op("rm", "remove", arg, FsError::NotFound));
            }
            for path in matched {
                match fs.remove(&path, recursive) {
                    Err(FsError::NotFound) if force => {}
                    other => other.map_err(|e| CommandError::op("rm", "remove", &path, e))?,
                }
            }
        }
        Ok(String::new())
    }

    fn cmd_grep(
        &mut self,
        fs: &mut Vfs,
        args: &[String],
        input: Option<&str>,
    ) -> Result<String, CommandError> {
        let parsed = parse_args("grep", args, "cinv", "")?;
        let usage = || {
            missing(
                "grep",
                "pattern or file",
                "grep PATTERN FILE",
                "grep ERROR server.log",
            )
        };
        let (pattern, files) = parsed.positional.split_first().ok_or_else(usage)?;

        let mut sources: Vec<(Option<String>, String)> = Vec::new();
        if files.is_empty() {
            sources.push((None, input.ok_or_else(usage)?.to_string()));
        } else {
            for path in Self::expand_all(fs, "grep", files)? {
                let content = fs.read(&path).map_err(|e| CommandError::path("grep", &path, e))?;
                sources.push((Some(path), content.to_string()));
            }
        }

        let fold = parsed.has('i');
        let needle = if fold { pattern.to_lowercase() } else { pattern.clone() };
        let multi = sources.len() > 1;
        let mut out = Vec::new();
        let mut selected_total = 0;
        for (name, content) in &sources {
            let prefix = match name {
                Some(n) if multi => format!("{}:", n),
                _ => String::new(),
            };
            let selected: Vec<(usize, &str)> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| {
                    let hit = if fold {
                        line.to_lowercase().contains(&needle)
                    } else {
                        line.contains(needle.as_str())
                    };
                    hit != parsed.has('v')
                })
                .map(|(i, line)| (i + 1, line))
                .collect();
            selected_total += selected.len();
            if parsed.has('c') {
                out.push(format!("{}{}", prefix, selected.len()));
            } else {
                for (n, line) in selected {
                    if parsed.has('n') {
                        out.push(format!("{}{}:{}", prefix, n, line));
                    } else {
                        out.push(format!("{}{}", prefix, line));
                    }
                }
            }
        }
        if selected_total > 0 {
            self.triggers.push(Achievement::GrepGuru);
        }
        Ok(out.join("\n"))
    }

    fn cmd_find(&mut self, fs: &mut Vfs, args: &[String]) -> Result<String, CommandError> {
        let (start, mut rest) = match args.split_first() {
            Some((first, rest)) if !first.starts_with('-') => (first.as_str(), rest),
            _ => (".", args),
        };
        let mut name: Option<Glob> = None;
        let mut want_dir: Option<bool> = None;
        while let Some((flag, tail)) = rest.split_first() {
            let value = tail.first().ok_or_else(|| {
                missing(
                    "find",
                    format!("argument to '{}'", flag),
                    "find . -name PATTERN",
                    "find . -name \"*.txt\"",
                )
            })?;
            match (flag.as_str(), value.as_str()) {
                ("-name", pattern) => name = Some(Glob::new(pattern)),
                ("-type", "d") => want_dir = Some(true),
                ("-type", "f") => want_dir = Some(false),
                ("-type", other) => {
                    return Err(CommandError::InvalidArgument {
                        verb: "find",
                        value: other.to_string(),
                    })
                }
                (other, _) => {
                    return Err(CommandError::InvalidArgument {
                        verb: "find",
                        value: other.to_string(),
                    })
                }
            }
            rest = &tail[1..];
        }
        let entries = fs
            .walk(start)
            .map_err(|e| CommandError::path("find", start, e))?;
        let hits: Vec<String> = entries
            .into_iter()
            .filter(|(path, node)| {
                let base = path.rsplit('/').next().unwrap_or(path);
                name.as_ref().map_or(true, |g| g.matches(base))
                    && want_dir.map_or(true, |d| node.is_dir() == d)
            })
            .map(|(path, _)| path)
            .collect();
        Ok(hits.join("\n"))
    }

    fn cmd_head_tail(
        &mut self,
        fs: &mut Vfs,
        verb: &'static str,
        args: &[String],
        input: Option<&str>,
    ) -> Result<String, CommandError> {
        let parsed = parse_args(verb, args, "", "n")?;
        let count = match parsed.value('n') {
            Some(v) => v.parse::<usize>().map_err(|_| CommandError::InvalidArgument {
                verb,
                value: v.to_string(),
            })?,
            None => 10,
        };
        let (usage, example) = if verb == "head" {
            ("head -n NUMBER FILE", "head -n 5 data.txt")
        } else {
            ("tail -n NUMBER FILE", "tail -n 5 data.txt")
        };
        let content = match parsed.positional.first() {
            Some(path) => fs
                .read(path)
                .map_err(|e| CommandError::path(verb, path, e))?
                .to_string(),
            None => input
                .map(str::to_string)
                .ok_or_else(|| missing(verb, "file", usage, example))?,
        };
        let lines: Vec<&str> = content.split('\n').collect();
        let picked = if verb == "head" {
            &lines[..count.min(lines.len())]
        } else {
            &lines[lines.len().saturating_sub(count)..]
        };
        Ok(picked.join("\n"))
    }

    fn cmd_wc(
        &mut self,
        fs: &mut Vfs,
        args: &[String],
        input: Option<&str>,
    ) -> Result<String, CommandError> {
        let parsed = parse_args("wc", args, "lwc", "")?;
        let (content, name) = match parsed.positional.first() {
            Some(path) => (
                fs.read(path)
                    .map_err(|e| CommandError::path("wc", path, e))?
                    .to_string(),
                Some(path.as_str()),
            ),
            None => (
                input
                    .map(str::to_string)
                    .ok_or_else(|| missing("wc", "file", "wc -l FILE", "wc -l data.txt"))?,
                None,
            ),
        };
        // Piped text counts only non-empty lines.
        let lines = if name.is_some() {
            content.lines().count()
        } else {
            content.lines().filter(|l| !l.is_empty()).count()
        };
        let counts = [
            ('l', lines),
            ('w', content.split_whitespace().count()),
            ('c', content.chars().count()),
        ];
        let selected: Vec<String> = counts
            .iter()
            .filter(|(flag, _)| parsed.has(*flag))
            .map(|(_, n)| n.to_string())
            .collect();
        if !selected.is_empty() {
            return Ok(selected.join(" "));
        }
        let all: Vec<String> = counts.iter().map(|(_, n)| n.to_string()).collect();
        Ok(match name {
            Some(n) => format!("{} {}", all.join(" "), n),
            None => all.join(" "),
        })
    }

    fn cmd_man(&mut self, args: &[String]) -> Result<String, CommandError> {
        self.triggers.push(Achievement::Rtfm);
        match args.first() {
            None => Ok("What manual page do you want? Try: man ls".into()),
            Some(topic) => Command::from_verb(topic)
                .map(|c| c.man_page().to_string())
                .ok_or_else(|| CommandError::NoManualEntry(topic.clone())),
        }
    }
}

/// Shell prompt with the home directory shown as `~`.
pub fn prompt(fs: &Vfs, user: &str, host: &str) -> String {
    format!("{}@{}:{}$ ", user, host, fs.display(fs.cwd()))
}
