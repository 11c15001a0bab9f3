use crate::config::DEFAULT_HOME;
use crate::error::{FsError, FsResult};
use crate::glob::{is_glob, Glob};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node of the in-memory tree. Children keep insertion order, which is the
/// order `ls` and `find` report them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FsNode {
    Directory { children: IndexMap<String, FsNode> },
    File { content: String },
}

impl FsNode {
    pub fn dir() -> Self {
        FsNode::Directory {
            children: IndexMap::new(),
        }
    }

    pub fn file(content: &str) -> Self {
        FsNode::File {
            content: content.into(),
        }
    }

    /// Builder used for the seeded tree.
    fn with(mut self, name: &str, node: FsNode) -> Self {
        if let FsNode::Directory { children } = &mut self {
            children.insert(name.into(), node);
        }
        self
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FsNode::Directory { .. })
    }

    pub fn children(&self) -> Option<&IndexMap<String, FsNode>> {
        match self {
            FsNode::Directory { children } => Some(children),
            FsNode::File { .. } => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut IndexMap<String, FsNode>> {
        match self {
            FsNode::Directory { children } => Some(children),
            FsNode::File { .. } => None,
        }
    }
}

/// The starting filesystem of a new game.
pub fn seed() -> FsNode {
    FsNode::dir()
        .with(
            "documents",
            FsNode::dir()
                .with(
                    "report.txt",
                    FsNode::file("Q3 Revenue Report\nTotal: $1.2M\nGrowth: 15%"),
                )
                .with("notes.txt", FsNode::file("Meeting notes from yesterday")),
        )
        .with(
            "logs",
            FsNode::dir()
                .with(
                    "server.log",
                    FsNode::file(
                        "INFO: Server started\nWARNING: High memory usage\nERROR: Connection timeout\nINFO: Request completed\nERROR: Database connection failed",
                    ),
                )
                .with(
                    "access.log",
                    FsNode::file(
                        "User admin logged in\nUser bob logged in\nUser alice logged in\nUser admin logged out",
                    ),
                )
                .with(
                    "error.log",
                    FsNode::file(
                        "ERROR: File not found\nERROR: Permission denied\nWARNING: Disk space low",
                    ),
                ),
        )
        .with(
            "projects",
            FsNode::dir().with(
                "website",
                FsNode::dir()
                    .with("index.html", FsNode::file("<html><body>Welcome</body></html>"))
                    .with("style.css", FsNode::file("body { margin: 0; }")),
            ),
        )
        .with(
            "message.txt",
            FsNode::file("Welcome to TechCorp! Good luck on your first day."),
        )
        .with("test.txt", FsNode::file("This is a test file."))
        .with("old.txt", FsNode::file("This file needs a new name."))
        .with("junk.txt", FsNode::file("Delete me!"))
        .with(
            "users.txt",
            FsNode::file("alice:admin\nbob:developer\ncarol:designer\ndave:developer\neve:manager"),
        )
        .with(
            "config.txt",
            FsNode::file(
                "server_port=8080\ndatabase_host=localhost\ndebug_mode=false\nmax_connections=100",
            ),
        )
        .with(
            "data.txt",
            FsNode::file(
                "Line 1: Apple\nLine 2: Banana\nLine 3: Cherry\nLine 4: Date\nLine 5: Elderberry\nLine 6: Fig\nLine 7: Grape\nLine 8: Honeydew\nLine 9: Kiwi\nLine 10: Lemon",
            ),
        )
}

/// In-memory filesystem rooted at the home directory. Nothing above home
/// exists; `..` stops there.
pub struct Vfs {
    root: FsNode,
    cwd: String,
    home: String,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    pub fn new() -> Self {
        Self::with_home(DEFAULT_HOME)
    }

    pub fn with_home(home: &str) -> Self {
        Vfs {
            root: seed(),
            cwd: home.into(),
            home: home.into(),
        }
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Lexically resolve `path` to segments below home. Absolute paths must
    /// start with the home path.
    fn segments(&self, path: &str) -> FsResult<Vec<String>> {
        let (mut parts, rest): (Vec<String>, &str) = if path == "~" {
            (Vec::new(), "")
        } else if let Some(rest) = path.strip_prefix("~/") {
            (Vec::new(), rest)
        } else if path.starts_with('/') {
            match path.strip_prefix(self.home.as_str()) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => (Vec::new(), rest),
                _ => return Err(FsError::NotFound),
            }
        } else {
            (self.cwd_segments(), path)
        };
        for part in rest.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                _ => parts.push(part.to_string()),
            }
        }
        Ok(parts)
    }

    fn cwd_segments(&self) -> Vec<String> {
        self.cwd
            .strip_prefix(self.home.as_str())
            .unwrap_or("")
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    fn join(&self, segs: &[String]) -> String {
        if segs.is_empty() {
            self.home.clone()
        } else {
            format!("{}/{}", self.home, segs.join("/"))
        }
    }

    /// Canonical absolute form of `path`, whether or not it exists.
    pub fn normalize(&self, path: &str) -> FsResult<String> {
        self.segments(path).map(|s| self.join(&s))
    }

    /// `path` with the home prefix shown as `~`.
    pub fn display(&self, path: &str) -> String {
        match path.strip_prefix(self.home.as_str()) {
            Some("") => "~".into(),
            Some(rest) if rest.starts_with('/') => format!("~{}", rest),
            _ => path.into(),
        }
    }

    fn node_at(&self, segs: &[String]) -> FsResult<&FsNode> {
        let mut node = &self.root;
        for part in segs {
            let children = node.children().ok_or(FsError::NotADirectory)?;
            node = children.get(part).ok_or(FsError::NotFound)?;
        }
        Ok(node)
    }

    fn node_at_mut(&mut self, segs: &[String]) -> FsResult<&mut FsNode> {
        let mut node = &mut self.root;
        for part in segs {
            let children = node.children_mut().ok_or(FsError::NotADirectory)?;
            node = children.get_mut(part).ok_or(FsError::NotFound)?;
        }
        Ok(node)
    }

    pub fn resolve(&self, path: &str) -> FsResult<&FsNode> {
        let segs = self.segments(path)?;
        self.node_at(&segs)
    }

    pub fn resolve_mut(&mut self, path: &str) -> FsResult<&mut FsNode> {
        let segs = self.segments(path)?;
        self.node_at_mut(&segs)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).map(FsNode::is_dir).unwrap_or(false)
    }

    /// Names in a directory, in stored order.
    pub fn list(&self, path: &str) -> FsResult<Vec<String>> {
        let node = self.resolve(path)?;
        let children = node.children().ok_or(FsError::NotADirectory)?;
        Ok(children.keys().cloned().collect())
    }

    pub fn read(&self, path: &str) -> FsResult<&str> {
        match self.resolve(path)? {
            FsNode::File { content } => Ok(content),
            FsNode::Directory { .. } => Err(FsError::IsADirectory),
        }
    }

    /// Change the working directory. `cwd` is untouched on failure.
    pub fn cd(&mut self, path: &str) -> FsResult<()> {
        let segs = self.segments(path)?;
        if !self.node_at(&segs)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        self.cwd = self.join(&segs);
        Ok(())
    }

    /// Children map of the parent of `segs`, plus the final name.
    fn parent_of<'a>(
        &mut self,
        segs: &'a [String],
    ) -> FsResult<(&mut IndexMap<String, FsNode>, &'a str)> {
        let (name, parent) = segs.split_last().ok_or(FsError::Protected)?;
        let dir = self.node_at_mut(parent)?;
        let children = dir.children_mut().ok_or(FsError::NotADirectory)?;
        Ok((children, name.as_str()))
    }

    /// Create an empty file. Existing paths are left alone; returns whether a
    /// file was created.
    pub fn touch(&mut self, path: &str) -> FsResult<bool> {
        let segs = self.segments(path)?;
        if segs.is_empty() {
            return Ok(false);
        }
        let (children, name) = self.parent_of(&segs)?;
        if children.contains_key(name) {
            return Ok(false);
        }
        children.insert(name.into(), FsNode::file(""));
        Ok(true)
    }

    pub fn mkdir(&mut self, path: &str) -> FsResult<()> {
        let segs = self.segments(path)?;
        if segs.is_empty() {
            return Err(FsError::AlreadyExists);
        }
        let (children, name) = self.parent_of(&segs)?;
        if children.contains_key(name) {
            return Err(FsError::AlreadyExists);
        }
        children.insert(name.into(), FsNode::dir());
        Ok(())
    }

    /// Create or overwrite a file. Returns whether it was created.
    pub fn write(&mut self, path: &str, data: &str) -> FsResult<bool> {
        let segs = self.segments(path)?;
        let (children, name) = self.parent_of(&segs)?;
        match children.get_mut(name) {
            Some(FsNode::File { content }) => {
                *content = data.into();
                Ok(false)
            }
            Some(FsNode::Directory { .. }) => Err(FsError::IsADirectory),
            None => {
                children.insert(name.into(), FsNode::file(data));
                Ok(true)
            }
        }
    }

    /// Append `data` on a new line of a non-empty file, creating it if
    /// needed. Returns whether it was created.
    pub fn append(&mut self, path: &str, data: &str) -> FsResult<bool> {
        let segs = self.segments(path)?;
        let (children, name) = self.parent_of(&segs)?;
        match children.get_mut(name) {
            Some(FsNode::File { content }) => {
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(data);
                Ok(false)
            }
            Some(FsNode::Directory { .. }) => Err(FsError::IsADirectory),
            None => {
                children.insert(name.into(), FsNode::file(data));
                Ok(true)
            }
        }
    }

    /// Where `src` lands for `cp`/`mv`: inside `dst` when it is an existing
    /// directory (or written with a trailing slash), otherwise at `dst`.
    fn target_segments(&self, src: &[String], dst: &str) -> FsResult<Vec<String>> {
        let mut segs = self.segments(dst)?;
        let into_dir = match self.node_at(&segs) {
            Ok(node) => node.is_dir(),
            Err(_) if dst.ends_with('/') => return Err(FsError::NotFound),
            Err(_) => false,
        };
        if into_dir {
            if let Some(name) = src.last() {
                segs.push(name.clone());
            }
        }
        Ok(segs)
    }

    /// Place a deep copy of `src` at `dst`. Directories need `recursive`.
    pub fn copy(&mut self, src: &str, dst: &str, recursive: bool) -> FsResult<()> {
        let src_segs = self.segments(src)?;
        let node = self.node_at(&src_segs)?.clone();
        if node.is_dir() && !recursive {
            return Err(FsError::RecursionRequired);
        }
        let target = self.target_segments(&src_segs, dst)?;
        if target == src_segs {
            return Ok(());
        }
        if node.is_dir() && target.starts_with(&src_segs) {
            return Err(FsError::InvalidMove);
        }
        let (children, name) = self.parent_of(&target)?;
        if let Some(existing) = children.get(name) {
            if existing.is_dir() {
                return Err(FsError::IsADirectory);
            }
        }
        children.insert(name.into(), node);
        Ok(())
    }

    /// Move or rename `src` to `dst`.
    pub fn rename(&mut self, src: &str, dst: &str) -> FsResult<()> {
        let src_segs = self.segments(src)?;
        if src_segs.is_empty() {
            return Err(FsError::Protected);
        }
        self.node_at(&src_segs)?;
        let target = self.target_segments(&src_segs, dst)?;
        if target == src_segs {
            return Ok(());
        }
        if target.starts_with(&src_segs) {
            return Err(FsError::InvalidMove);
        }
        {
            let (children, name) = self.parent_of(&target)?;
            if children.get(name).is_some_and(FsNode::is_dir) {
                return Err(FsError::IsADirectory);
            }
        }
        let node = {
            let (children, name) = self.parent_of(&src_segs)?;
            children.shift_remove(name).ok_or(FsError::NotFound)?
        };
        let (children, name) = self.parent_of(&target)?;
        children.insert(name.into(), node);
        self.repair_cwd();
        Ok(())
    }

    /// Delete a file, or a directory tree when `recursive`.
    pub fn remove(&mut self, path: &str, recursive: bool) -> FsResult<()> {
        let segs = self.segments(path)?;
        if segs.is_empty() {
            return Err(FsError::Protected);
        }
        if self.node_at(&segs)?.is_dir() && !recursive {
            return Err(FsError::RecursionRequired);
        }
        let (children, name) = self.parent_of(&segs)?;
        children.shift_remove(name);
        self.repair_cwd();
        Ok(())
    }

    /// Walk `cwd` up to its nearest surviving directory.
    fn repair_cwd(&mut self) {
        let mut segs = self.cwd_segments();
        while !segs.is_empty() && !self.node_at(&segs).map(FsNode::is_dir).unwrap_or(false) {
            segs.pop();
        }
        self.cwd = self.join(&segs);
    }

    /// Expand a `*` in the last segment of `pattern` against the directory it
    /// names. Paths keep the caller's spelling (`logs/*.log` yields
    /// `logs/server.log`). A pattern without `*` is returned as is.
    pub fn expand(&self, pattern: &str) -> FsResult<Vec<String>> {
        if !is_glob(pattern) {
            return Ok(vec![pattern.to_string()]);
        }
        let (prefix, dir, name_pat) = match pattern.rfind('/') {
            Some(0) => ("/", "/", &pattern[1..]),
            Some(i) => (&pattern[..=i], &pattern[..i], &pattern[i + 1..]),
            None => ("", ".", pattern),
        };
        let glob = Glob::new(name_pat);
        Ok(self
            .list(dir)?
            .into_iter()
            .filter(|name| glob.matches(name))
            .map(|name| format!("{}{}", prefix, name))
            .collect())
    }

    /// Pre-order walk below `start`. Each entry's path is `start` joined with
    /// the names leading to it (`./documents/report.txt`).
    pub fn walk<'a>(&'a self, start: &str) -> FsResult<Vec<(String, &'a FsNode)>> {
        fn visit<'a>(prefix: &str, node: &'a FsNode, out: &mut Vec<(String, &'a FsNode)>) {
            if let Some(children) = node.children() {
                for (name, child) in children {
                    let path = format!("{}/{}", prefix, name);
                    out.push((path.clone(), child));
                    visit(&path, child, out);
                }
            }
        }
        let node = self.resolve(start)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let prefix = if start == "/" {
            ""
        } else {
            start.trim_end_matches('/')
        };
        let mut out = Vec::new();
        visit(prefix, node, &mut out);
        Ok(out)
    }

    /// Deep copy of the whole tree.
    pub fn snapshot(&self) -> FsNode {
        self.root.clone()
    }

    /// Replace the tree. `cwd` falls back to the nearest directory that still
    /// exists.
    pub fn restore(&mut self, root: FsNode) {
        self.root = if root.is_dir() { root } else { seed() };
        self.repair_cwd();
    }

    /// Fresh seeded tree, back home.
    pub fn reset(&mut self) {
        self.root = seed();
        self.cwd = self.home.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_forms() {
        let mut fs = Vfs::new();
        fs.cd("documents").unwrap();
        let forms = [
            "report.txt",
            "./report.txt",
            "../documents/report.txt",
            "~/documents/report.txt",
            "/home/user/documents/report.txt",
        ];
        for p in forms {
            assert!(fs.resolve(p).is_ok(), "{p}");
        }
        assert_eq!(fs.resolve("/etc/passwd"), Err(FsError::NotFound));
    }

    #[test]
    fn test_resolve_mut_edits_in_place() {
        let mut fs = Vfs::new();
        if let FsNode::File { content } = fs.resolve_mut("~/test.txt").unwrap() {
            content.push_str("\nmore");
        }
        assert!(fs.read("test.txt").unwrap().ends_with("\nmore"));
        assert_eq!(fs.resolve_mut("nope.txt").err(), Some(FsError::NotFound));
        assert!(fs.resolve_mut("~").unwrap().is_dir());
    }

    #[test]
    fn test_parent_clamped_at_home() {
        let mut fs = Vfs::new();
        fs.cd("../../..").unwrap();
        assert_eq!(fs.cwd(), "/home/user");
        fs.cd("projects/website").unwrap();
        assert_eq!(fs.cwd(), "/home/user/projects/website");
        fs.cd("..").unwrap();
        assert_eq!(fs.cwd(), "/home/user/projects");
    }

    #[test]
    fn test_cd_failure_keeps_cwd() {
        let mut fs = Vfs::new();
        fs.cd("logs").unwrap();
        assert_eq!(fs.cd("nope"), Err(FsError::NotFound));
        assert_eq!(fs.cd("server.log"), Err(FsError::NotADirectory));
        assert_eq!(fs.cwd(), "/home/user/logs");
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let fs = Vfs::new();
        let names = fs.list(".").unwrap();
        assert_eq!(&names[..3], &["documents", "logs", "projects"]);
        assert_eq!(fs.list("message.txt"), Err(FsError::NotADirectory));
    }

    #[test]
    fn test_read_errors() {
        let fs = Vfs::new();
        assert_eq!(fs.read("logs"), Err(FsError::IsADirectory));
        assert_eq!(fs.read("missing.txt"), Err(FsError::NotFound));
    }

    #[test]
    fn test_touch_is_idempotent() {
        let mut fs = Vfs::new();
        assert_eq!(fs.touch("test.txt"), Ok(false));
        assert_eq!(fs.read("test.txt").unwrap(), "This is a test file.");
        assert_eq!(fs.touch("new.txt"), Ok(true));
        assert_eq!(fs.touch("new.txt"), Ok(false));
    }

    #[test]
    fn test_mkdir_twice() {
        let mut fs = Vfs::new();
        fs.mkdir("src").unwrap();
        assert_eq!(fs.mkdir("src"), Err(FsError::AlreadyExists));
        assert_eq!(fs.mkdir("test.txt"), Err(FsError::AlreadyExists));
        assert_eq!(fs.mkdir("a/b"), Err(FsError::NotFound));
    }

    #[test]
    fn test_copy_into_directory() {
        let mut fs = Vfs::new();
        fs.mkdir("backup").unwrap();
        fs.copy("test.txt", "backup/", false).unwrap();
        assert_eq!(fs.read("backup/test.txt").unwrap(), "This is a test file.");
        assert_eq!(fs.copy("nope", "x", false), Err(FsError::NotFound));
    }

    #[test]
    fn test_copy_directory_is_deep() {
        let mut fs = Vfs::new();
        assert_eq!(fs.copy("documents", "docs", false), Err(FsError::RecursionRequired));
        fs.copy("documents", "docs", true).unwrap();
        fs.write("docs/notes.txt", "changed").unwrap();
        assert_eq!(fs.read("documents/notes.txt").unwrap(), "Meeting notes from yesterday");
        assert_eq!(fs.copy("documents", "documents/inner", true), Err(FsError::InvalidMove));
    }

    #[test]
    fn test_rename_moves_content() {
        let mut fs = Vfs::new();
        fs.rename("old.txt", "new.txt").unwrap();
        assert!(!fs.exists("old.txt"));
        assert_eq!(fs.read("new.txt").unwrap(), "This file needs a new name.");
        assert_eq!(fs.rename("logs", "logs/inner"), Err(FsError::InvalidMove));
    }

    #[test]
    fn test_remove_fixes_cwd() {
        let mut fs = Vfs::new();
        fs.cd("projects/website").unwrap();
        assert_eq!(fs.remove("..", false), Err(FsError::RecursionRequired));
        fs.remove("~/projects", true).unwrap();
        assert_eq!(fs.cwd(), "/home/user");
        assert_eq!(fs.remove("~", true), Err(FsError::Protected));
    }

    #[test]
    fn test_append_joins_with_newline() {
        let mut fs = Vfs::new();
        assert_eq!(fs.append("info.txt", "admin"), Ok(true));
        fs.append("info.txt", "root").unwrap();
        assert_eq!(fs.read("info.txt").unwrap(), "admin\nroot");
        assert_eq!(fs.write("logs", "x"), Err(FsError::IsADirectory));
    }

    #[test]
    fn test_expand_glob() {
        let fs = Vfs::new();
        let logs = fs.expand("logs/*.log").unwrap();
        assert_eq!(logs, vec!["logs/server.log", "logs/access.log", "logs/error.log"]);
        assert_eq!(fs.expand("plain").unwrap(), vec!["plain"]);
        assert!(fs.expand("*.none").unwrap().is_empty());
    }

    #[test]
    fn test_walk_is_preorder() {
        let fs = Vfs::new();
        let paths: Vec<String> = fs.walk(".").unwrap().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths[0], "./documents");
        assert_eq!(paths[1], "./documents/report.txt");
        assert_eq!(paths[3], "./logs");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut fs = Vfs::new();
        let snap = fs.snapshot();
        fs.remove("junk.txt", false).unwrap();
        fs.restore(snap);
        assert!(fs.exists("junk.txt"));
    }

    #[test]
    fn test_display_uses_tilde() {
        let fs = Vfs::new();
        assert_eq!(fs.display("/home/user"), "~");
        assert_eq!(fs.display("/home/user/logs"), "~/logs");
    }
}
