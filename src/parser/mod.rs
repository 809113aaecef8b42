//! Parsing sessions
//!
//! A [`ConfigParser`] owns the arena every node lives in, the table of
//! loaded files and the table of named objects (file roots and `define`
//! blocks). Several files parsed by the same parser share those tables, so
//! an object defined in one file can be included from another.

mod grammar;
mod include;
pub mod lexer;
pub mod source;

pub use source::{FsSource, MemorySource, SourceProvider};

use crate::diagnostics::{ErrorKind, ParseError, Result};
use crate::document::{Arena, ConfigFile, FileId, ObjectId, RuleId};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Parser options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Directory relative include paths are resolved against; the working
    /// directory when unset
    pub include_root: Option<PathBuf>,
    /// Expand `*`, `?` and `[` in include arguments
    pub expand_globs: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_root: None,
            expand_globs: true,
        }
    }
}

/// Parses configuration files into one shared document graph
pub struct ConfigParser {
    arena: Arena,
    /// File roots by path and `define` blocks by name
    objects: BTreeMap<String, ObjectId>,
    files: BTreeMap<String, FileId>,
    source: Box<dyn SourceProvider>,
    options: ParseOptions,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Parser reading from disk, configured by `options`
    pub fn with_options(options: ParseOptions) -> Self {
        let source = match &options.include_root {
            Some(root) => FsSource::with_root(root),
            None => FsSource::new(),
        };
        Self {
            arena: Arena::new(),
            objects: BTreeMap::new(),
            files: BTreeMap::new(),
            source: Box::new(source),
            options,
        }
    }

    /// Replace where file content is read from
    pub fn with_source(mut self, source: impl SourceProvider + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Load and parse `path`, returning its file-level object.
    ///
    /// Fails with [`ErrorKind::AlreadyLoaded`] if the path was parsed
    /// before, either directly or through an `include`.
    pub fn parse_file(&mut self, path: &str) -> Result<ObjectId> {
        if self.objects.contains_key(path) {
            return Err(ParseError::file(
                ErrorKind::AlreadyLoaded,
                format!("configuration file `{path}` is already loaded"),
            )
            .with_hint("each file is parsed once per parser; look it up with `object()` instead"));
        }
        self.load_file(path)
    }

    /// File root or `define` block registered under `name`
    pub fn object(&self, name: &str) -> Option<ObjectId> {
        self.objects.get(name).copied()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Paths of every file loaded so far, sorted
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Rules under `object` that no directive binder consumed.
    ///
    /// The blocks of unused rules are not descended into; the unused rule
    /// already covers them.
    pub fn unused_rules(&self, object: ObjectId) -> Vec<RuleId> {
        let mut unused = Vec::new();
        self.collect_unused(object, &mut unused);
        unused.sort_by_key(|rule| {
            let token = &self.arena[self.arena[*rule].token];
            (token.file, token.offset)
        });
        unused
    }

    fn collect_unused(&self, object: ObjectId, unused: &mut Vec<RuleId>) {
        for rule in self.arena[object].all_rules() {
            if !self.arena[rule].is_used() {
                unused.push(rule);
            } else if let Some(block) = self.arena.block_of(rule) {
                self.collect_unused(block, unused);
            }
        }
    }

    /// Read, tokenize and parse one file, registering it under `path`
    fn load_file(&mut self, path: &str) -> Result<ObjectId> {
        if self.files.contains_key(path) {
            return Err(ParseError::file(
                ErrorKind::CircularImport,
                format!("circular import of `{path}`"),
            )
            .with_hint("a file cannot include itself, directly or through other files"));
        }

        let objects = self.objects.clone();
        let files = self.files.clone();
        let result = self.read_and_parse(path);
        if result.is_err() {
            // nothing a failed load registered stays visible to later loads
            debug!(path, "discarding files and defines of failed load");
            self.objects = objects;
            self.files = files;
        }
        result
    }

    fn read_and_parse(&mut self, path: &str) -> Result<ObjectId> {
        debug!(path, "loading configuration file");
        let raw = self.source.read(path).map_err(|e| {
            ParseError::file(
                ErrorKind::FileUnreadable,
                format!("failed to read configuration file `{path}`: {e}"),
            )
        })?;

        let file = self.arena.alloc_file(ConfigFile::new(path, &raw));
        self.files.insert(path.to_string(), file);

        let lexed = lexer::tokenize(&self.arena[file].content, file);
        let tokens = match lexed {
            Ok(tokens) => tokens,
            Err(e) => {
                let token = self.arena.alloc_token(e.token);
                return Err(ParseError::at_token(&self.arena, e.kind, token, e.message).with_hint(e.hint));
            }
        };
        trace!(path, tokens = tokens.len(), "tokenized");

        let ids: Vec<_> = tokens
            .into_iter()
            .map(|token| self.arena.alloc_token(token))
            .collect();
        self.arena[file].tokens = ids;

        let root = self.parse_root(file)?;
        self.objects.insert(path.to_string(), root);
        debug!(path, rules = self.arena[root].all_rules().count(), "parsed configuration file");
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ArgumentValue, Key, Keyword};

    fn parser(files: &[(&str, &str)]) -> ConfigParser {
        let source = files
            .iter()
            .fold(MemorySource::new(), |source, (path, content)| {
                source.with_file(*path, *content)
            });
        ConfigParser::new().with_source(source)
    }

    fn args(parser: &ConfigParser, rule: RuleId) -> Vec<ArgumentValue> {
        let arena = parser.arena();
        arena[rule]
            .arguments
            .iter()
            .map(|arg| arena[*arg].value.clone())
            .collect()
    }

    #[test]
    fn test_parse_server_block() {
        let mut p = parser(&[(
            "site.conf",
            "server { listen 8080; location /a { root \"/var/www\"; } }",
        )]);
        let root = p.parse_file("site.conf").unwrap();
        let arena = p.arena();

        let servers = arena[root].rules_for(Key::Server);
        assert_eq!(servers.len(), 1);
        let server = arena.block_of(servers[0]).unwrap();

        let listen = arena[server].rules_for(Key::Listen);
        assert_eq!(args(&p, listen[0]), vec![ArgumentValue::Str("8080".into())]);

        let location = arena[server].rules_for(Key::Location)[0];
        let location_args = args(&p, location);
        assert_eq!(location_args[0], ArgumentValue::Str("/a".into()));
        let block = location_args[1].as_object().unwrap();
        let root_rule = arena[block].rules_for(Key::Root)[0];
        assert_eq!(args(&p, root_rule), vec![ArgumentValue::Str("/var/www".into())]);

        assert_eq!(arena[block].parent_rule, Some(location));
        assert_eq!(arena[location].parent, server);
    }

    #[test]
    fn test_keywords_only_from_bare_text() {
        let mut p = parser(&[("a.conf", "autoindex on;\nautoindex \"on\";\n")]);
        let root = p.parse_file("a.conf").unwrap();
        let rules = p.arena()[root].rules_for(Key::Autoindex).to_vec();
        assert_eq!(args(&p, rules[0]), vec![ArgumentValue::Keyword(Keyword::On)]);
        assert_eq!(args(&p, rules[1]), vec![ArgumentValue::Str("on".into())]);
    }

    #[test]
    fn test_comment_does_not_change_rule() {
        let mut p = parser(&[
            ("a.conf", "# comment\nroot value;"),
            ("b.conf", "root value;"),
        ]);
        let a = p.parse_file("a.conf").unwrap();
        let b = p.parse_file("b.conf").unwrap();
        let ra = p.arena()[a].rules_for(Key::Root)[0];
        let rb = p.arena()[b].rules_for(Key::Root)[0];
        assert_eq!(args(&p, ra), args(&p, rb));
    }

    #[test]
    fn test_optional_semicolon_after_block() {
        let mut p = parser(&[("a.conf", "server { listen 80; };\nserver { listen 81; }\n")]);
        let root = p.parse_file("a.conf").unwrap();
        assert_eq!(p.arena()[root].rules_for(Key::Server).len(), 2);
    }

    #[test]
    fn test_errors() {
        let cases: &[(&str, ErrorKind)] = &[
            ("proxy_pass x;", ErrorKind::UnknownDirective),
            ("\"root\" x;", ErrorKind::UnexpectedToken),
            ("root x }", ErrorKind::UnexpectedToken),
            ("root x", ErrorKind::UnexpectedToken),
            ("server { listen 80;", ErrorKind::UnexpectedToken),
            ("root x; }", ErrorKind::UnexpectedToken),
            ("root \"\";", ErrorKind::EmptyQuote),
            ("root \"x;", ErrorKind::UnmatchedQuote),
        ];
        for (content, kind) in cases {
            let mut p = parser(&[("bad.conf", content)]);
            let err = p.parse_file("bad.conf").unwrap_err();
            assert_eq!(err.kind(), *kind, "for {content:?}: {err}");
            assert!(err.location().is_some(), "for {content:?}");
        }
    }

    #[test]
    fn test_unknown_directive_points_at_key() {
        let mut p = parser(&[("a.conf", "server {\n    lisen 80;\n}\n")]);
        let err = p.parse_file("a.conf").unwrap_err();
        let ctx = err.location().unwrap();
        assert_eq!((ctx.line_number, ctx.column, ctx.width), (2, 5, 5));
    }

    #[test]
    fn test_unreadable_and_already_loaded() {
        let mut p = parser(&[("a.conf", "root x;")]);
        assert_eq!(
            p.parse_file("missing.conf").unwrap_err().kind(),
            ErrorKind::FileUnreadable
        );
        p.parse_file("a.conf").unwrap();
        assert_eq!(
            p.parse_file("a.conf").unwrap_err().kind(),
            ErrorKind::AlreadyLoaded
        );
        assert_eq!(p.files().collect::<Vec<_>>(), vec!["a.conf"]);
    }

    #[test]
    fn test_failed_include_is_reported_for_every_includer() {
        let mut p = parser(&[
            ("common.conf", "root 'x;"),
            ("a.conf", "include common.conf;"),
            ("b.conf", "include common.conf;"),
        ]);
        for file in ["a.conf", "b.conf", "common.conf"] {
            assert_eq!(p.parse_file(file).unwrap_err().kind(), ErrorKind::UnmatchedQuote);
        }
        assert_eq!(p.files().count(), 0);
    }

    #[test]
    fn test_failed_file_leaves_no_defines_behind() {
        let mut p = parser(&[
            ("bad.conf", "define shared { index a; }
bogus x;
"),
            ("good.conf", "define shared { index b; }
include shared;
"),
        ]);
        assert_eq!(p.parse_file("bad.conf").unwrap_err().kind(), ErrorKind::UnknownDirective);
        assert!(p.object("shared").is_none());

        let root = p.parse_file("good.conf").unwrap();
        assert_eq!(p.arena()[root].rules_for(Key::Index).len(), 1);
        assert_eq!(p.files().collect::<Vec<_>>(), vec!["good.conf"]);
    }

    #[test]
    fn test_unused_rules() {
        let mut p = parser(&[("a.conf", "root x;\nserver { listen 80; index a; }\n")]);
        let root = p.parse_file("a.conf").unwrap();
        let arena = p.arena();
        let server = arena[root].rules_for(Key::Server)[0];
        assert_eq!(p.unused_rules(root).len(), 2);

        arena[server].mark_used();
        let block = arena.block_of(server).unwrap();
        arena[arena[block].rules_for(Key::Listen)[0]].mark_used();
        let unused = p.unused_rules(root);
        assert_eq!(unused.len(), 2);
        assert_eq!(arena[unused[0]].key, Key::Root);
        assert_eq!(arena[unused[1]].key, Key::Index);
    }
}
