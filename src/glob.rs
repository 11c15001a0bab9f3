use regex::Regex;

/// A `*`-only wildcard applied to a single path segment.
///
/// `*` matches any run of characters; everything else is literal. There is
/// no `?`, no character classes and no `**`.
#[derive(Debug, Clone)]
pub struct Glob {
    re: Option<Regex>,
    literal: String,
}

impl Glob {
    pub fn new(pattern: &str) -> Glob {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        // Only an oversized pattern can fail to compile; it then matches literally.
        Glob {
            re: Regex::new(&format!("^{}$", body)).ok(),
            literal: pattern.to_string(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.re {
            Some(re) => re.is_match(name),
            None => self.literal == name,
        }
    }
}

pub fn is_glob(s: &str) -> bool {
    s.contains('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_pattern() {
        let g = Glob::new("*.txt");
        assert!(g.matches("message.txt"));
        assert!(g.matches(".txt"));
        assert!(!g.matches("documents"));
        assert!(!g.matches("notes.txt.bak"));
    }

    #[test]
    fn test_dot_is_literal() {
        let g = Glob::new("a.b");
        assert!(g.matches("a.b"));
        assert!(!g.matches("axb"));
    }

    #[test]
    fn test_literal_and_middle_star() {
        assert!(Glob::new("config.txt").matches("config.txt"));
        assert!(Glob::new("s*r.log").matches("server.log"));
        assert!(!Glob::new("s*r.log").matches("access.log"));
    }
}
