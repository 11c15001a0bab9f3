//! Command-line parsing: tokens, `&&` chains, pipes, redirection and
//! per-command flags.

use crate::error::CommandError;
use std::collections::{BTreeMap, BTreeSet};

/// Output redirection attached to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub append: bool,
}

/// One stage of a pipeline: verb plus arguments, quotes already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub verb: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub redirect: Option<Redirect>,
}

impl Pipeline {
    /// A single stage with no redirection.
    pub fn as_simple(&self) -> Option<&Stage> {
        match (self.stages.as_slice(), &self.redirect) {
            ([stage], None) => Some(stage),
            _ => None,
        }
    }
}

/// A full input line: pipelines joined by `&&`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub chain: Vec<Pipeline>,
}

impl CommandLine {
    pub fn parse(input: &str) -> Result<CommandLine, CommandError> {
        let mut chain = Vec::new();
        for segment in split_unquoted(input, "&&")? {
            if segment.is_empty() {
                return Err(CommandError::Syntax("unexpected '&&'".into()));
            }
            chain.push(parse_pipeline(&segment)?);
        }
        Ok(CommandLine { chain })
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Every verb of every stage, in order.
    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.chain
            .iter()
            .flat_map(|p| p.stages.iter().map(|s| s.verb.as_str()))
    }

    /// Canonical text: single spaces, no quotes.
    pub fn canonical(&self) -> String {
        self.chain
            .iter()
            .map(|p| {
                let mut text = p
                    .stages
                    .iter()
                    .map(|s| {
                        std::iter::once(s.verb.as_str())
                            .chain(s.args.iter().map(String::as_str))
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                if let Some(r) = &p.redirect {
                    text.push_str(if r.append { " >> " } else { " > " });
                    text.push_str(&r.target);
                }
                text
            })
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

fn parse_pipeline(input: &str) -> Result<Pipeline, CommandError> {
    let (body, redirect) = split_redirect(input)?;
    let mut stages = Vec::new();
    for part in split_unquoted(body, "|")? {
        let mut tokens = tokenize(&part)?.into_iter();
        match tokens.next() {
            Some(verb) => stages.push(Stage {
                verb,
                args: tokens.collect(),
            }),
            None => return Err(CommandError::Syntax("unexpected '|'".into())),
        }
    }
    if stages.is_empty() {
        return Err(CommandError::Syntax("missing command".into()));
    }
    Ok(Pipeline { stages, redirect })
}

/// Split on every unquoted occurrence of `sep`, trimming each part. The
/// quotes are kept for the tokenizer.
fn split_unquoted(input: &str, sep: &str) -> Result<Vec<String>, CommandError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut rest = input;
    while let Some(ch) = rest.chars().next() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if rest.starts_with(sep) => {
                parts.push(current.trim().to_string());
                current.clear();
                rest = &rest[sep.len()..];
                continue;
            }
            None => {}
        }
        current.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    if quote.is_some() {
        return Err(CommandError::Syntax("unterminated quote".into()));
    }
    let last = current.trim().to_string();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    Ok(parts)
}

/// Take the first unquoted `>` or `>>` and everything after it as the target.
fn split_redirect(input: &str) -> Result<(&str, Option<Redirect>), CommandError> {
    let mut quote: Option<char> = None;
    for (i, ch) in input.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => {
                let append = input[i + 1..].starts_with('>');
                let rest = &input[i + if append { 2 } else { 1 }..];
                let mut target = tokenize(rest)?;
                if target.len() != 1 {
                    return Err(CommandError::Syntax("redirection needs one target".into()));
                }
                let target = target.remove(0);
                return Ok((
                    input[..i].trim(),
                    Some(Redirect { target, append }),
                ));
            }
            None => {}
        }
    }
    Ok((input.trim(), None))
}

/// Split on whitespace, honoring single and double quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                _ => {
                    current.push(ch);
                    in_token = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err(CommandError::Syntax("unterminated quote".into()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Flags and operands of one command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub flags: BTreeSet<char>,
    pub values: BTreeMap<char, String>,
    pub positional: Vec<String>,
}

impl ParsedArgs {
    pub fn has(&self, flag: char) -> bool {
        self.flags.contains(&flag)
    }

    pub fn value(&self, flag: char) -> Option<&str> {
        self.values.get(&flag).map(String::as_str)
    }
}

/// Parse a leading run of `-x` flags (combinable, `-in`) followed by
/// operands. `allowed` lists boolean flags, `valued` flags that take the
/// next token (`-n 5`). A lone `-` or anything after `--` is an operand.
pub fn parse_args(
    verb: &'static str,
    args: &[String],
    allowed: &str,
    valued: &str,
) -> Result<ParsedArgs, CommandError> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            parsed.positional.extend(iter.by_ref().cloned());
            break;
        }
        let Some(flags) = arg.strip_prefix('-').filter(|f| !f.is_empty()) else {
            parsed.positional.push(arg.clone());
            parsed.positional.extend(iter.by_ref().cloned());
            break;
        };
        let mut chars = flags.chars();
        while let Some(c) = chars.next() {
            if valued.contains(c) {
                let inline: String = chars.by_ref().collect();
                let value = if inline.is_empty() {
                    iter.next().cloned().ok_or_else(|| CommandError::InvalidArgument {
                        verb,
                        value: format!("-{}", c),
                    })?
                } else {
                    inline
                };
                parsed.values.insert(c, value);
            } else if allowed.contains(c) {
                parsed.flags.insert(c);
            } else {
                return Err(CommandError::InvalidOption {
                    verb,
                    option: c.to_string(),
                });
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"find . -name "*.txt""#).unwrap(),
            s(&["find", ".", "-name", "*.txt"])
        );
        assert_eq!(tokenize("echo 'a  b' c").unwrap(), s(&["echo", "a  b", "c"]));
        assert_eq!(tokenize(r#"echo """#).unwrap(), s(&["echo", ""]));
        assert!(tokenize("echo \"oops").is_err());
    }

    #[test]
    fn test_parse_pipe_and_redirect() {
        let line = CommandLine::parse("grep ERROR logs/*.log | wc -l > report.txt").unwrap();
        assert_eq!(line.chain.len(), 1);
        let p = &line.chain[0];
        assert_eq!(p.stages.len(), 2);
        assert_eq!(p.stages[1].verb, "wc");
        assert_eq!(
            p.redirect,
            Some(Redirect {
                target: "report.txt".into(),
                append: false
            })
        );
    }

    #[test]
    fn test_parse_append_and_chain() {
        let line = CommandLine::parse(r#"echo "admin">>info.txt && ls"#).unwrap();
        assert_eq!(line.chain.len(), 2);
        assert!(line.chain[0].redirect.as_ref().unwrap().append);
        assert_eq!(line.canonical(), "echo admin >> info.txt && ls");
    }

    #[test]
    fn test_quoted_operators_are_literal() {
        let line = CommandLine::parse(r#"echo "a | b > c""#).unwrap();
        let stage = line.chain[0].as_simple().unwrap();
        assert_eq!(stage.args, s(&["a | b > c"]));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(CommandLine::parse("ls |").is_err());
        assert!(CommandLine::parse("ls >").is_err());
        assert!(CommandLine::parse("&& ls").is_err());
        assert!(CommandLine::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_args_flags_any_order() {
        let a = parse_args("grep", &s(&["-v", "-in", "ERROR", "f.log"]), "cinv", "").unwrap();
        assert!(a.has('i') && a.has('n') && a.has('v'));
        assert!(!a.has('c'));
        assert_eq!(a.positional, s(&["ERROR", "f.log"]));
    }

    #[test]
    fn test_parse_args_values() {
        let a = parse_args("head", &s(&["-n", "3", "data.txt"]), "", "n").unwrap();
        assert_eq!(a.value('n'), Some("3"));
        let b = parse_args("head", &s(&["-n5", "data.txt"]), "", "n").unwrap();
        assert_eq!(b.value('n'), Some("5"));
        assert!(parse_args("head", &s(&["-n"]), "", "n").is_err());
    }

    #[test]
    fn test_parse_args_unknown_flag() {
        let err = parse_args("grep", &s(&["-x", "a", "b"]), "cinv", "").unwrap_err();
        assert_eq!(err.to_string(), "grep: invalid option -- 'x'");
    }

    #[test]
    fn test_flags_stop_at_first_operand() {
        let a = parse_args("grep", &s(&["-n", "-v", "x", "-c"]), "cinv", "").unwrap();
        assert!(!a.has('c'));
        assert_eq!(a.positional, s(&["x", "-c"]));
    }
}
