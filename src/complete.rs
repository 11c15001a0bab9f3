use crate::command::Command;
use crate::vfs::Vfs;
use serde::Serialize;

/// Outcome of a tab press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Completion {
    /// The whole input line, completed.
    Single(String),
    /// Candidate names to show; the line is left as is.
    Multiple(Vec<String>),
    None,
}

impl Completion {
    fn from_candidates(mut candidates: Vec<(String, String)>) -> Completion {
        match candidates.len() {
            0 => Completion::None,
            1 => Completion::Single(candidates.remove(0).1),
            _ => Completion::Multiple(candidates.into_iter().map(|(name, _)| name).collect()),
        }
    }
}

/// Complete the verb when the line has no space yet, otherwise the last
/// path operand of a path-taking verb.
pub fn complete(line: &str, fs: &Vfs) -> Completion {
    let line = line.trim_start();
    let Some(space) = line.find(char::is_whitespace) else {
        let candidates = Command::ALL
            .iter()
            .map(|c| c.name())
            .filter(|name| name.starts_with(line))
            .map(|name| (name.to_string(), format!("{} ", name)))
            .collect();
        return Completion::from_candidates(candidates);
    };

    let verb = &line[..space];
    let Some(cmd) = Command::from_verb(verb).filter(|c| c.takes_paths()) else {
        return Completion::None;
    };
    let word_start = line
        .rfind(char::is_whitespace)
        .map(|i| i + 1)
        .unwrap_or(line.len());
    let (head, word) = line.split_at(word_start);
    let (dir_part, prefix) = match word.rfind('/') {
        Some(i) => word.split_at(i + 1),
        None => ("", word),
    };
    let lookup = if dir_part.is_empty() { "." } else { dir_part };
    let Ok(children) = fs.resolve(lookup).map(|n| n.children()) else {
        return Completion::None;
    };
    let Some(children) = children else {
        return Completion::None;
    };

    let candidates = children
        .iter()
        .filter(|(name, node)| name.starts_with(prefix) && (cmd != Command::Cd || node.is_dir()))
        .map(|(name, node)| {
            let suffix = if node.is_dir() { "/" } else { " " };
            (name.clone(), format!("{}{}{}{}", head, dir_part, name, suffix))
        })
        .collect();
    Completion::from_candidates(candidates)
}
